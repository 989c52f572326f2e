use crate::ballot::*;
use crate::config::*;
use crate::converter::ConverterGeneral;
use crate::error::*;
use crate::profile::*;

/// A builder for adding ballots one at a time.
///
/// When the candidates are declared first, every ballot is checked against them and
/// declares them as its own candidates: a ranking that omits a declared candidate leaves
/// it unordered rather than absent.
///
/// ```
/// pub use social_choice::builder::ProfileBuilder;
/// # use social_choice::VotingError;
///
/// let mut builder = ProfileBuilder::new().candidates(&["Anna".to_string(), "Bob".to_string()]);
///
/// builder.add_ballot_simple("Anna > Bob")?;
/// builder.add_ballot("Bob", 2.0, Some("Clara"))?;
///
/// let profile = builder.build()?;
/// assert_eq!(profile.total_weight(), 3.0);
/// # Ok::<(), VotingError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    pub(crate) _candidates: Option<CandidateSet>,
    pub(crate) _entries: Vec<ProfileEntry>,
}

impl ProfileBuilder {
    pub fn new() -> ProfileBuilder {
        ProfileBuilder::default()
    }

    pub fn candidates(self, cands: &[String]) -> ProfileBuilder {
        ProfileBuilder {
            _candidates: Some(candidate_set(cands)),
            _entries: self._entries,
        }
    }

    /// Adds a ballot with weight 1.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_ballot_simple<B: Into<RawBallot>>(&mut self, ballot: B) -> VotingResult<()> {
        self.add_ballot(ballot, 1.0, None)
    }

    /// Adds a ballot, with a weight and possibly the name of the voter.
    pub fn add_ballot<B: Into<RawBallot>>(&mut self, ballot: B, weight: f64, voter: Option<&str>) -> VotingResult<()> {
        let ballot = ConverterGeneral::DEFAULT.convert(&ballot.into(), None)?;
        let ballot = match self._candidates.as_ref() {
            Some(cands) => declare(&ballot, cands)?,
            None => ballot,
        };
        self._entries.push(ProfileEntry {
            ballot,
            weight,
            voter: voter.map(|s| s.to_string()),
        });
        Ok(())
    }

    pub fn build(self) -> VotingResult<Profile> {
        Profile::from_entries(self._entries)
    }
}

// Rebuilds the ballot with the declared candidates of the election.
fn declare(ballot: &Ballot, cands: &CandidateSet) -> VotingResult<Ballot> {
    let undeclared = ballot.candidates().difference(cands).next();
    if let Some(c) = undeclared {
        return ConversionSnafu {
            message: format!("undeclared candidate {:?}", c),
        }
        .fail();
    }
    Ok(match ballot {
        Ballot::Order(b) => Ballot::Order(BallotOrder::new(b.as_weak_order().to_vec(), Some(cands.clone()))?),
        Ballot::Levels(b) => Ballot::Levels(BallotLevels::new(
            b.as_dict().clone(),
            Some(cands.clone()),
            Some(b.scale().clone()),
        )?),
        Ballot::OneName(b) => Ballot::OneName(BallotOneName::new(b.candidate().cloned(), Some(cands.clone()))),
        Ballot::Plurality(b) => Ballot::Plurality(BallotOneName::new(b.candidate().cloned(), Some(cands.clone()))),
        Ballot::Veto(b) => Ballot::Veto(BallotOneName::new(b.candidate().cloned(), Some(cands.clone()))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_candidates_are_unordered() {
        let mut builder = ProfileBuilder::new().candidates(&["a".to_string(), "b".to_string(), "c".to_string()]);
        builder.add_ballot_simple("a > b").unwrap();
        let profile = builder.build().unwrap();
        match profile.ballots()[0] {
            Ballot::Order(b) => assert_eq!(b.candidates_not_in_b(), candidate_set(&["c"])),
            b => panic!("unexpected ballot {:?}", b),
        }
    }

    #[test]
    fn undeclared_candidate_is_rejected() {
        let mut builder = ProfileBuilder::new().candidates(&["a".to_string()]);
        let res = builder.add_ballot_simple("a > z");
        assert!(matches!(res, Err(VotingError::Conversion { .. })));
        let mut free = ProfileBuilder::new();
        free.add_ballot("z", 0.5, Some("v1")).unwrap();
        assert_eq!(free.build().unwrap().voters(), vec![Some("v1")]);
    }
}
