use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::ballot::*;
use crate::config::*;
use crate::error::*;
use crate::level::Level;
use crate::scale::Scale;

/// Scores given by one ballot. A candidate that is missing, or mapped to `None`, is not
/// counted at all: the ballot does not even count in its weighted average. A score of 0
/// is counted.
pub type Scores = BTreeMap<Candidate, Option<Level>>;

/// Turns one ballot into a score for each candidate.
///
/// The ballot is expected to be already converted to the right shape and restricted to the
/// candidates of the election.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Scorer {
    Levels(ScorerLevels),
    Borda(ScorerBorda),
    Bucklin(ScorerBucklin),
    Plurality(ScorerPlurality),
    Veto(ScorerVeto),
}

impl Scorer {
    pub fn scores(&self, ballot: &Ballot, voter: Option<&str>, candidates: &CandidateSet) -> VotingResult<Scores> {
        let res = match self {
            Scorer::Levels(s) => s.scores(ballot, candidates),
            Scorer::Borda(s) => s.scores(ballot, candidates),
            Scorer::Bucklin(s) => s.scores(ballot, candidates),
            Scorer::Plurality(s) => s.scores(ballot, candidates),
            Scorer::Veto(s) => s.scores(ballot, candidates),
        }?;
        debug!("scores: voter {:?}: {:?}", voter, res);
        Ok(res)
    }

    /// The scale in which the scores are expressed.
    pub fn scale(&self) -> Scale {
        match self {
            Scorer::Levels(s) => s.scale.clone(),
            Scorer::Bucklin(_) => Scale::interval(0.0, 1.0),
            Scorer::Plurality(_) => Scale::range(0, 1),
            Scorer::Veto(_) => Scale::range(-1, 0),
            Scorer::Borda(_) => Scale::Natural,
        }
    }
}

/// The scores as floats, for display or for numeric aggregation.
pub fn scores_as_floats(scores: &Scores) -> VotingResult<BTreeMap<Candidate, Option<f64>>> {
    let mut res = BTreeMap::new();
    for (c, v) in scores.iter() {
        let x = match v {
            None => None,
            Some(l) => Some(l.as_f64().context(ScaleMismatchSnafu {
                message: format!("score {} of {:?} is not a number", l, c),
            })?),
        };
        res.insert(c.clone(), x);
    }
    Ok(res)
}

fn unexpected(scorer: &str, ballot: &Ballot) -> VotingError {
    VotingError::Conversion {
        message: format!("the {} scorer cannot read a {} ballot", scorer, ballot.kind_name()),
    }
}

fn order_of(scorer: &str, ballot: &Ballot) -> VotingResult<BallotOrder> {
    match ballot {
        Ballot::Order(_) | Ballot::Levels(_) => ballot.as_order(),
        _ => Err(unexpected(scorer, ballot)),
    }
}

// Splits a budget of points between the members of a class, best classes first.
fn share(scores: &mut BTreeMap<Candidate, f64>, class: &CandidateSet, remaining: &mut f64) {
    let n = class.len() as f64;
    let each = if n <= *remaining {
        *remaining -= n;
        1.0
    } else {
        let each = *remaining / n;
        *remaining = 0.0;
        each
    };
    for c in class.iter() {
        scores.insert(c.clone(), each);
    }
}

// ********* Levels ***********

/// Reads the level given by an evaluation.
///
/// Candidates of the ballot that were not evaluated get `level_ungraded`, candidates of
/// the election that the voter could not evaluate get `level_absent`.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerLevels {
    pub scale: Scale,
    pub level_ungraded: Option<Level>,
    pub level_absent: Option<Level>,
}

impl ScorerLevels {
    pub fn new(scale: Scale) -> ScorerLevels {
        ScorerLevels {
            scale,
            level_ungraded: None,
            level_absent: None,
        }
    }

    fn scores(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Scores> {
        let b = match ballot {
            Ballot::Levels(b) => b,
            _ => return Err(unexpected("levels", ballot)),
        };
        let mut res: Scores = b.as_dict().iter().map(|(c, v)| (c.clone(), Some(v.clone()))).collect();
        for c in b.candidates_not_in_b() {
            res.insert(c, self.level_ungraded.clone());
        }
        for c in candidates.difference(b.candidates()) {
            res.insert(c.clone(), self.level_absent.clone());
        }
        Ok(res)
    }
}

// ********* Borda ***********

/// Borda points of a ranking (see [`BallotOrder::borda`]).
///
/// With `absent_give_points`, the candidates of the election that were not available to
/// the voter count as beaten by all the ballot candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerBorda {
    pub absent_give_points: bool,
    pub absent_receive_points: PointsPolicy,
    pub unordered_give_points: bool,
    pub unordered_receive_points: PointsPolicy,
}

impl Default for ScorerBorda {
    fn default() -> ScorerBorda {
        ScorerBorda {
            absent_give_points: true,
            absent_receive_points: PointsPolicy::Receive,
            unordered_give_points: true,
            unordered_receive_points: PointsPolicy::Receive,
        }
    }
}

impl ScorerBorda {
    fn scores(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Scores> {
        let b = order_of("borda", ballot)?;
        let absent: CandidateSet = candidates.difference(b.candidates()).cloned().collect();
        let n_absent = absent.len() as f64;
        let mut points = b.borda(self.unordered_give_points, self.unordered_receive_points);
        if self.absent_give_points {
            for p in points.values_mut() {
                *p += n_absent;
            }
        }
        let absent_points = match self.absent_receive_points {
            PointsPolicy::Receive => Some((n_absent - 1.0) / 2.0),
            PointsPolicy::Zero => Some(0.0),
            PointsPolicy::Ignore => None,
        };
        if let Some(p) = absent_points {
            for c in absent {
                points.insert(c, p);
            }
        }
        Ok(points.into_iter().map(|(c, p)| (c, Some(Level::Float(p)))).collect())
    }
}

// ********* Bucklin ***********

/// Bucklin points: each of the `k` best candidates of the ranking gets one point.
///
/// A class that does not fit in the remaining budget shares it evenly. Unordered
/// candidates come after the ranked ones and absent candidates last; each group shares
/// what remains, gets 0 or is left out according to its policy.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerBucklin {
    pub k: usize,
    pub unordered_receive_points: PointsPolicy,
    pub absent_receive_points: PointsPolicy,
}

impl ScorerBucklin {
    pub fn new(k: usize) -> ScorerBucklin {
        ScorerBucklin {
            k,
            unordered_receive_points: PointsPolicy::Receive,
            absent_receive_points: PointsPolicy::Receive,
        }
    }

    fn scores(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Scores> {
        let b = order_of("bucklin", ballot)?;
        let mut scores: BTreeMap<Candidate, f64> = BTreeMap::new();
        let mut remaining = self.k as f64;
        for class in b.as_weak_order() {
            share(&mut scores, class, &mut remaining);
        }
        let unordered = b.candidates_not_in_b();
        let absent: CandidateSet = candidates.difference(b.candidates()).cloned().collect();
        for (group, policy) in [
            (unordered, self.unordered_receive_points),
            (absent, self.absent_receive_points),
        ] {
            match policy {
                PointsPolicy::Receive if !group.is_empty() => share(&mut scores, &group, &mut remaining),
                PointsPolicy::Zero => {
                    for c in group {
                        scores.insert(c, 0.0);
                    }
                }
                _ => {}
            }
        }
        Ok(scores.into_iter().map(|(c, p)| (c, Some(Level::Float(p)))).collect())
    }
}

impl Default for ScorerBucklin {
    fn default() -> ScorerBucklin {
        ScorerBucklin::new(1)
    }
}

// ********* Plurality and veto ***********

/// One point for the chosen candidate, 0 for the other candidates of the election.
///
/// An abstention gives 0 to everybody when `count_abstention`, otherwise it is not
/// counted at all.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerPlurality {
    pub count_abstention: bool,
}

impl ScorerPlurality {
    fn scores(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Scores> {
        match ballot {
            Ballot::Plurality(b) | Ballot::OneName(b) => Ok(one_name_scores(b, candidates, 1, self.count_abstention)),
            _ => Err(unexpected("plurality", ballot)),
        }
    }
}

/// Minus one point for the vetoed candidate, 0 for the other candidates of the election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerVeto {
    pub count_abstention: bool,
}

impl ScorerVeto {
    fn scores(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Scores> {
        match ballot {
            Ballot::Veto(b) | Ballot::OneName(b) => Ok(one_name_scores(b, candidates, -1, self.count_abstention)),
            _ => Err(unexpected("veto", ballot)),
        }
    }
}

fn one_name_scores(b: &BallotOneName, candidates: &CandidateSet, named: i64, count_abstention: bool) -> Scores {
    match b.candidate() {
        None if !count_abstention => Scores::new(),
        chosen => candidates
            .iter()
            .map(|c| {
                let points = if Some(c) == chosen { named } else { 0 };
                (c.clone(), Some(Level::Int(points)))
            })
            .collect(),
    }
}
