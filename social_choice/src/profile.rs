use log::{info, warn};

use crate::ballot::*;
use crate::config::*;
use crate::converter::*;
use crate::error::*;

/// One ballot of a profile, with its weight and the voter who cast it.
#[derive(PartialEq, Debug, Clone)]
pub struct ProfileEntry {
    pub ballot: Ballot,
    pub weight: f64,
    pub voter: Option<String>,
}

/// The weighted collection of ballots of an election.
///
/// Raw ballots are read with [`ConverterGeneral`]. Weights default to 1 and must be finite
/// and non-negative. Voter labels are kept as metadata and are not required to be unique.
///
/// ```
/// use social_choice::*;
///
/// let profile = Profile::new(vec!["a > b".into(), "b > a".into()], Some(vec![2.0, 1.0]), None)?;
/// assert_eq!(profile.len(), 2);
/// assert_eq!(profile.total_weight(), 3.0);
/// # Ok::<(), VotingError>(())
/// ```
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Profile {
    entries: Vec<ProfileEntry>,
}

impl Profile {
    pub fn new(
        ballots: Vec<RawBallot>,
        weights: Option<Vec<f64>>,
        voters: Option<Vec<String>>,
    ) -> VotingResult<Profile> {
        let n = ballots.len();
        let weights = weights.unwrap_or_else(|| vec![1.0; n]);
        if weights.len() != n {
            return InvalidProfileSnafu {
                message: format!("{} weights for {} ballots", weights.len(), n),
            }
            .fail();
        }
        let voters: Vec<Option<String>> = match voters {
            Some(v) if v.len() != n => {
                return InvalidProfileSnafu {
                    message: format!("{} voters for {} ballots", v.len(), n),
                }
                .fail();
            }
            Some(v) => v.into_iter().map(Some).collect(),
            None => vec![None; n],
        };
        let converter = ConverterGeneral::DEFAULT;
        let mut entries: Vec<ProfileEntry> = Vec::with_capacity(n);
        for ((raw, weight), voter) in ballots.iter().zip(weights).zip(voters) {
            entries.push(ProfileEntry {
                ballot: converter.convert(raw, None)?,
                weight,
                voter,
            });
        }
        Profile::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<ProfileEntry>) -> VotingResult<Profile> {
        if let Some(e) = entries.iter().find(|e| !e.weight.is_finite() || e.weight < 0.0) {
            return InvalidProfileSnafu {
                message: format!("invalid weight {} for ballot {:?}", e.weight, e.ballot),
            }
            .fail();
        }
        Ok(Profile { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileEntry> {
        self.entries.iter()
    }

    pub fn ballots(&self) -> Vec<&Ballot> {
        self.entries.iter().map(|e| &e.ballot).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    pub fn voters(&self) -> Vec<Option<&str>> {
        self.entries.iter().map(|e| e.voter.as_deref()).collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// All the candidates declared by at least one ballot.
    pub fn candidates(&self) -> CandidateSet {
        self.entries
            .iter()
            .flat_map(|e| e.ballot.candidates().iter().cloned())
            .collect()
    }
}

/// A profile prepared for one evaluation: every ballot converted to the shape a rule or a
/// matrix works with, and the candidates of the election settled.
#[derive(PartialEq, Debug, Clone)]
pub struct LoadedProfile {
    pub converted: Profile,
    pub candidates: CandidateSet,
}

/// Converts all the ballots with `converter`, restricted to `candidates` when they are
/// given. Otherwise the candidates are all those of the converted ballots.
///
/// Ballots that do not declare exactly the candidates of the election are tolerated: this
/// is reported as a warning and the computation proceeds.
pub fn load_profile(
    profile: &Profile,
    converter: &Converter,
    candidates: Option<&CandidateSet>,
) -> VotingResult<LoadedProfile> {
    let mut entries: Vec<ProfileEntry> = Vec::with_capacity(profile.len());
    for e in profile.iter() {
        entries.push(ProfileEntry {
            ballot: converter.convert(&RawBallot::Ballot(e.ballot.clone()), candidates)?,
            weight: e.weight,
            voter: e.voter.clone(),
        });
    }
    let converted = Profile { entries };
    let candidates = match candidates {
        Some(cands) => cands.clone(),
        None => converted.candidates(),
    };
    let inconsistent = converted
        .iter()
        .filter(|e| e.ballot.candidates() != &candidates)
        .count();
    if inconsistent > 0 {
        warn!(
            "load_profile: {} ballot(s) do not have the same set of candidates as the whole election {:?}",
            inconsistent, candidates
        );
    }
    info!(
        "load_profile: {} ballots, {} candidates, total weight {}",
        converted.len(),
        candidates.len(),
        converted.total_weight()
    );
    Ok(LoadedProfile {
        converted,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_and_voters_must_fit() {
        let ballots: Vec<RawBallot> = vec!["a > b".into(), "b".into()];
        assert!(matches!(
            Profile::new(ballots.clone(), Some(vec![1.0]), None),
            Err(VotingError::InvalidProfile { .. })
        ));
        assert!(matches!(
            Profile::new(ballots.clone(), Some(vec![1.0, -2.0]), None),
            Err(VotingError::InvalidProfile { .. })
        ));
        assert!(matches!(
            Profile::new(ballots.clone(), None, Some(vec!["x".to_string()])),
            Err(VotingError::InvalidProfile { .. })
        ));
        let p = Profile::new(ballots, None, Some(vec!["x".to_string(), "x".to_string()])).unwrap();
        assert_eq!(p.weights(), vec![1.0, 1.0]);
        assert_eq!(p.voters(), vec![Some("x"), Some("x")]);
        assert_eq!(p.candidates(), candidate_set(&["a", "b"]));
    }

    #[test]
    fn loading_infers_the_candidates() {
        let p = Profile::new(vec!["a > b".into(), "c > a".into()], None, None).unwrap();
        let loaded = load_profile(&p, &Converter::default(), None).unwrap();
        assert_eq!(loaded.candidates, candidate_set(&["a", "b", "c"]));
        let cands = candidate_set(&["a", "c"]);
        let loaded = load_profile(&p, &Converter::default(), Some(&cands)).unwrap();
        assert_eq!(loaded.candidates, cands);
        assert_eq!(
            loaded.converted.ballots()[0],
            &Ballot::Order(BallotOrder::parse("a", None).unwrap())
        );
    }
}
