// ********* Shared vocabulary ***********

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A candidate is identified by its name.
pub type Candidate = String;

/// Sets of candidates iterate in ascending order, which keeps every output deterministic.
pub type CandidateSet = BTreeSet<Candidate>;

/// Builds a candidate set from anything that looks like names.
pub fn candidate_set<S: AsRef<str>>(names: &[S]) -> CandidateSet {
    names.iter().map(|s| s.as_ref().to_string()).collect()
}

// ********* Configuration **********

/// What happens to candidates that a ballot does not rank.
///
/// It applies separately to `unordered` candidates (available to the voter but not
/// ranked) and `absent` candidates (not even available when the ballot was cast).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointsPolicy {
    /// They share the points as if they were tied below the ranked candidates.
    Receive,
    /// They are scored 0.
    Zero,
    /// They are left out of the scores altogether.
    Ignore,
}

/// Coefficients of the weighted majority matrix.
///
/// For each ordered pair `(c, d)` of distinct candidates, a ballot contributes the
/// coefficient of its situation. `None` means the ballot is not counted for this pair,
/// not even in the normalising weight.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorityCoefficients {
    pub higher_vs_lower: Option<f64>,
    pub lower_vs_higher: Option<f64>,
    pub indifference: Option<f64>,
    pub ordered_vs_unordered: Option<f64>,
    pub unordered_vs_ordered: Option<f64>,
    pub unordered_vs_unordered: Option<f64>,
    pub ordered_vs_absent: Option<f64>,
    pub absent_vs_ordered: Option<f64>,
    pub unordered_vs_absent: Option<f64>,
    pub absent_vs_unordered: Option<f64>,
    pub absent_vs_absent: Option<f64>,
    pub diagonal_score: f64,
    pub default_score: f64,
}

impl MajorityCoefficients {
    pub const DEFAULT: MajorityCoefficients = MajorityCoefficients {
        higher_vs_lower: Some(1.0),
        lower_vs_higher: Some(0.0),
        indifference: Some(0.5),
        ordered_vs_unordered: Some(1.0),
        unordered_vs_ordered: Some(0.0),
        unordered_vs_unordered: Some(0.5),
        ordered_vs_absent: None,
        absent_vs_ordered: None,
        unordered_vs_absent: None,
        absent_vs_unordered: None,
        absent_vs_absent: None,
        diagonal_score: 0.0,
        default_score: 0.0,
    };
}

impl Default for MajorityCoefficients {
    fn default() -> MajorityCoefficients {
        MajorityCoefficients::DEFAULT
    }
}
