use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::*;
use crate::error::*;

/// The tie-break policy.
///
/// Given a set of tied candidates, it either chooses one of them or sorts them all.
/// `reverse` asks for the choice from the other end, which is what is needed to pick
/// the candidate to eliminate or to veto.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    /// Refuse to break a tie: choosing among two or more candidates is an error.
    Unambiguous,
    /// Alphabetical order of the names, first is best.
    Ascending,
    /// Reverse alphabetical order of the names, first is best.
    Descending,
    /// An order that is hard to guess in advance, derived from a cryptographic hash of
    /// the seed and the candidate names. The same seed always gives the same order.
    Random(u32),
}

impl Priority {
    pub const DEFAULT: Priority = Priority::Unambiguous;

    /// Chooses one candidate. An empty set gives `None`.
    pub fn choice(&self, candidates: &CandidateSet, reverse: bool) -> VotingResult<Option<Candidate>> {
        if candidates.len() <= 1 {
            return Ok(candidates.iter().next().cloned());
        }
        let sorted = self.sort(candidates, reverse)?;
        Ok(sorted.into_iter().next())
    }

    /// Sorts all the candidates, the preferred one first (or last with `reverse`).
    pub fn sort(&self, candidates: &CandidateSet, reverse: bool) -> VotingResult<Vec<Candidate>> {
        let mut res: Vec<Candidate> = match self {
            Priority::Unambiguous if candidates.len() > 1 => {
                return AmbiguousTieSnafu {
                    candidates: candidates.iter().cloned().collect::<Vec<_>>(),
                }
                .fail();
            }
            Priority::Unambiguous | Priority::Ascending => candidates.iter().cloned().collect(),
            Priority::Descending => candidates.iter().rev().cloned().collect(),
            Priority::Random(seed) => candidate_permutation_crypto(candidates, *seed),
        };
        if reverse {
            res.reverse();
        }
        Ok(res)
    }
}

impl Default for Priority {
    fn default() -> Priority {
        Priority::DEFAULT
    }
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to
/// guess in advance: candidates are sorted by the SHA-256 digest of the seed and their name.
fn candidate_permutation_crypto(candidates: &CandidateSet, seed: u32) -> Vec<Candidate> {
    let mut data: Vec<(String, Candidate)> = candidates
        .iter()
        .map(|name| (sha256::digest(format!("{:08}{}", seed, name)), name.clone()))
        .collect();
    data.sort();
    debug!("candidate_permutation_crypto: seed {}: {:?}", seed, data);
    data.into_iter().map(|p| p.1).collect()
}
