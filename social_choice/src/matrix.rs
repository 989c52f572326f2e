use std::collections::BTreeMap;

use log::debug;
use ndarray::Array2;
use once_cell::unsync::OnceCell;
use serde::Serialize;

use crate::ballot::*;
use crate::config::*;
use crate::converter::*;
use crate::error::*;
use crate::profile::*;

/// Aggregates a whole profile into a table of coefficients, one per ordered pair of
/// candidates (the diagonal included).
#[derive(PartialEq, Debug, Clone)]
pub enum Matrix {
    WeightedMajority(MatrixWeightedMajority),
    Majority(MatrixMajority),
}

impl Matrix {
    pub fn weighted_majority() -> Matrix {
        Matrix::WeightedMajority(MatrixWeightedMajority::default())
    }

    pub fn majority() -> Matrix {
        Matrix::Majority(MatrixMajority::default())
    }

    /// Converts the ballots, settles the candidates (see [`load_profile`]) and computes the
    /// coefficients.
    pub fn load(&self, profile: &Profile, candidates: Option<&CandidateSet>) -> VotingResult<MatrixOutcome> {
        match self {
            Matrix::WeightedMajority(m) => m.load(profile, candidates),
            Matrix::Majority(m) => m.load(profile, candidates),
        }
    }
}

/// The weighted majority matrix.
///
/// For each ordered pair `(c, d)` of distinct candidates, every ballot contributes its
/// weight times the coefficient of its situation (`c` preferred, indifferent, unordered,
/// absent, see [`MajorityCoefficients`]). The coefficient of the pair is the total
/// divided by the weight of the ballots that were counted, or `default_score` when none
/// was. In antisymmetric mode, the result is `M[c, d] - M[d, c]`.
#[derive(PartialEq, Debug, Clone)]
pub struct MatrixWeightedMajority {
    pub converter: Converter,
    pub coefficients: MajorityCoefficients,
    pub antisymmetric: bool,
}

impl Default for MatrixWeightedMajority {
    fn default() -> MatrixWeightedMajority {
        MatrixWeightedMajority {
            converter: Converter::ToOrder(ConverterToOrder::default()),
            coefficients: MajorityCoefficients::DEFAULT,
            antisymmetric: false,
        }
    }
}

/// Coefficients indexed by ordered pairs of candidates.
pub type PairMap = BTreeMap<(Candidate, Candidate), f64>;

impl MatrixWeightedMajority {
    pub fn antisymmetric() -> MatrixWeightedMajority {
        MatrixWeightedMajority {
            antisymmetric: true,
            ..MatrixWeightedMajority::default()
        }
    }

    pub fn load(&self, profile: &Profile, candidates: Option<&CandidateSet>) -> VotingResult<MatrixOutcome> {
        let loaded = load_profile(profile, &self.converter, candidates)?;
        let mut gross: PairMap = BTreeMap::new();
        let mut weights: PairMap = BTreeMap::new();
        for c in loaded.candidates.iter() {
            for d in loaded.candidates.iter() {
                if c != d {
                    gross.insert((c.clone(), d.clone()), 0.0);
                    weights.insert((c.clone(), d.clone()), 0.0);
                }
            }
        }
        for e in loaded.converted.iter() {
            let order = e.ballot.as_order()?;
            let ranks: BTreeMap<&Candidate, usize> = order
                .as_weak_order()
                .iter()
                .enumerate()
                .flat_map(|(i, class)| class.iter().map(move |c| (c, i)))
                .collect();
            for ((c, d), g) in gross.iter_mut() {
                if let Some(v) = self.coefficient(&order, &ranks, c, d) {
                    *g += e.weight * v;
                    if let Some(w) = weights.get_mut(&(c.clone(), d.clone())) {
                        *w += e.weight;
                    }
                }
            }
        }
        let mut as_dict: PairMap = BTreeMap::new();
        for c in loaded.candidates.iter() {
            as_dict.insert((c.clone(), c.clone()), self.coefficients.diagonal_score);
        }
        for (pair, g) in gross.iter() {
            let w = weights.get(pair).cloned().unwrap_or(0.0);
            let value = if w > 0.0 { g / w } else { self.coefficients.default_score };
            as_dict.insert(pair.clone(), value);
        }
        if self.antisymmetric {
            as_dict = as_dict
                .iter()
                .map(|((c, d), v)| {
                    let other = as_dict.get(&(d.clone(), c.clone())).cloned().unwrap_or(0.0);
                    ((c.clone(), d.clone()), v - other)
                })
                .collect();
        }
        debug!("load: weighted majority {:?}", as_dict);
        Ok(MatrixOutcome::new(loaded, as_dict, Some(gross), Some(weights)))
    }

    fn coefficient(
        &self,
        order: &BallotOrder,
        ranks: &BTreeMap<&Candidate, usize>,
        c: &Candidate,
        d: &Candidate,
    ) -> Option<f64> {
        let k = &self.coefficients;
        let situation = |x: &Candidate| match ranks.get(x) {
            Some(r) => Situation::Ordered(*r),
            None if order.candidates().contains(x) => Situation::Unordered,
            None => Situation::Absent,
        };
        match (situation(c), situation(d)) {
            (Situation::Ordered(i), Situation::Ordered(j)) if i < j => k.higher_vs_lower,
            (Situation::Ordered(i), Situation::Ordered(j)) if i > j => k.lower_vs_higher,
            (Situation::Ordered(_), Situation::Ordered(_)) => k.indifference,
            (Situation::Ordered(_), Situation::Unordered) => k.ordered_vs_unordered,
            (Situation::Unordered, Situation::Ordered(_)) => k.unordered_vs_ordered,
            (Situation::Unordered, Situation::Unordered) => k.unordered_vs_unordered,
            (Situation::Ordered(_), Situation::Absent) => k.ordered_vs_absent,
            (Situation::Absent, Situation::Ordered(_)) => k.absent_vs_ordered,
            (Situation::Unordered, Situation::Absent) => k.unordered_vs_absent,
            (Situation::Absent, Situation::Unordered) => k.absent_vs_unordered,
            (Situation::Absent, Situation::Absent) => k.absent_vs_absent,
        }
    }
}

#[derive(Clone, Copy)]
enum Situation {
    Ordered(usize),
    Unordered,
    Absent,
}

/// The majority matrix: `greater` when a candidate beats another in the weighted
/// majority matrix, `lower` when it is beaten and `equal` on a tie.
#[derive(PartialEq, Debug, Clone)]
pub struct MatrixMajority {
    pub weighted_majority: MatrixWeightedMajority,
    pub greater: f64,
    pub lower: f64,
    pub equal: f64,
    pub diagonal: f64,
}

impl Default for MatrixMajority {
    fn default() -> MatrixMajority {
        MatrixMajority {
            weighted_majority: MatrixWeightedMajority::default(),
            greater: 1.0,
            lower: 0.0,
            equal: 0.5,
            diagonal: 0.5,
        }
    }
}

impl MatrixMajority {
    pub fn load(&self, profile: &Profile, candidates: Option<&CandidateSet>) -> VotingResult<MatrixOutcome> {
        let weighted = self.weighted_majority.load(profile, candidates)?;
        let as_dict: PairMap = weighted
            .as_dict()
            .iter()
            .map(|((c, d), v)| {
                let value = if c == d {
                    self.diagonal
                } else {
                    let other = weighted.get(d, c).unwrap_or(0.0);
                    if *v > other {
                        self.greater
                    } else if *v < other {
                        self.lower
                    } else {
                        self.equal
                    }
                };
                ((c.clone(), d.clone()), value)
            })
            .collect();
        let loaded = LoadedProfile {
            converted: weighted.converted.clone(),
            candidates: weighted.candidates.clone(),
        };
        let mut outcome = MatrixOutcome::new(loaded, as_dict, None, None);
        outcome.weighted_majority = Some(Box::new(weighted));
        Ok(outcome)
    }
}

/// A matrix computed on one profile.
#[derive(Debug, Clone)]
pub struct MatrixOutcome {
    converted: Profile,
    candidates: CandidateSet,
    as_dict: PairMap,
    gross: Option<PairMap>,
    weights: Option<PairMap>,
    weighted_majority: Option<Box<MatrixOutcome>>,
    as_array: OnceCell<Array2<f64>>,
}

/// A matrix with its labels, ready to be printed or serialized.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct MatrixTable {
    pub candidates: Vec<Candidate>,
    pub rows: Vec<Vec<f64>>,
}

impl MatrixOutcome {
    fn new(loaded: LoadedProfile, as_dict: PairMap, gross: Option<PairMap>, weights: Option<PairMap>) -> MatrixOutcome {
        MatrixOutcome {
            converted: loaded.converted,
            candidates: loaded.candidates,
            as_dict,
            gross,
            weights,
            weighted_majority: None,
            as_array: OnceCell::new(),
        }
    }

    pub fn as_dict(&self) -> &PairMap {
        &self.as_dict
    }

    pub fn get(&self, c: &str, d: &str) -> Option<f64> {
        self.as_dict.get(&(c.to_string(), d.to_string())).cloned()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// The candidates in the order of the rows and columns of [`Self::as_array`].
    pub fn candidates_as_list(&self) -> Vec<Candidate> {
        self.candidates.iter().cloned().collect()
    }

    pub fn profile_converted(&self) -> &Profile {
        &self.converted
    }

    /// Sums of the weighted coefficients, before normalization.
    pub fn gross(&self) -> Option<&PairMap> {
        self.gross.as_ref()
    }

    /// Weights of the ballots counted for each pair.
    pub fn weights(&self) -> Option<&PairMap> {
        self.weights.as_ref()
    }

    /// The weighted majority matrix a majority matrix was derived from.
    pub fn weighted_majority(&self) -> Option<&MatrixOutcome> {
        self.weighted_majority.as_deref()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        self.as_array.get_or_init(|| {
            let names = self.candidates_as_list();
            let n = names.len();
            Array2::from_shape_fn((n, n), |(i, j)| {
                self.as_dict
                    .get(&(names[i].clone(), names[j].clone()))
                    .cloned()
                    .unwrap_or(0.0)
            })
        })
    }

    pub fn as_table(&self) -> MatrixTable {
        MatrixTable {
            candidates: self.candidates_as_list(),
            rows: self
                .as_array()
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(ballots: &[&str], weights: &[f64]) -> Profile {
        Profile::new(
            ballots.iter().map(|b| RawBallot::from(*b)).collect(),
            Some(weights.to_vec()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn weighted_majority() {
        let p = profile(&["a > b > c", "b > c > a"], &[6.0, 4.0]);
        let m = Matrix::weighted_majority().load(&p, None).unwrap();
        assert_eq!(m.get("a", "b"), Some(0.6));
        assert_eq!(m.get("b", "a"), Some(0.4));
        assert_eq!(m.get("b", "c"), Some(1.0));
        assert_eq!(m.get("c", "b"), Some(0.0));
        assert_eq!(m.get("a", "a"), Some(0.0));
        let array = m.as_array();
        assert_eq!(array.shape(), &[3, 3]);
        assert_eq!(array[[0, 2]], 0.6);
        assert_eq!(m.candidates_as_list(), vec!["a", "b", "c"]);
        assert_eq!(m.gross().unwrap().get(&("a".to_string(), "b".to_string())), Some(&6.0));
    }

    #[test]
    fn antisymmetric() {
        let p = profile(&["a > b > c", "b > a > c", "c > a > b"], &[3.0, 3.0, 2.0]);
        let m = Matrix::WeightedMajority(MatrixWeightedMajority::antisymmetric())
            .load(&p, None)
            .unwrap();
        assert_eq!(m.get("a", "b"), Some(0.25));
        assert_eq!(m.get("b", "a"), Some(-0.25));
        assert_eq!(m.get("c", "a"), Some(-0.5));
        assert_eq!(m.get("c", "c"), Some(0.0));
    }

    #[test]
    fn unordered_and_absent_pairs() {
        let ballots: Vec<RawBallot> = vec![
            Ballot::Order(BallotOrder::parse("a", Some(candidate_set(&["a", "b"]))).unwrap()).into(),
            "c > a".into(),
        ];
        let p = Profile::new(ballots, None, None).unwrap();
        let m = Matrix::weighted_majority().load(&p, None).unwrap();
        // a is ranked over the unordered b; c is absent from the first ballot.
        assert_eq!(m.get("a", "b"), Some(1.0));
        assert_eq!(m.get("b", "a"), Some(0.0));
        assert_eq!(m.get("c", "a"), Some(1.0));
        assert_eq!(m.get("b", "c"), Some(0.0));
        assert_eq!(m.weights().unwrap().get(&("b".to_string(), "c".to_string())), Some(&0.0));
    }

    #[test]
    fn majority_and_table() {
        let p = profile(&["a > b > c", "b > c > a", "c > a > b"], &[2.0, 1.0, 1.0]);
        let m = Matrix::majority().load(&p, None).unwrap();
        assert_eq!(m.get("a", "b"), Some(1.0));
        assert_eq!(m.get("b", "a"), Some(0.0));
        assert_eq!(m.get("a", "c"), Some(0.5));
        assert_eq!(m.get("a", "a"), Some(0.5));
        assert_eq!(m.weighted_majority().unwrap().get("a", "b"), Some(0.75));
        let table = m.as_table();
        assert_eq!(table.candidates, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0], vec![0.5, 1.0, 0.5]);
    }
}
