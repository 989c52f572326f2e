use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::error::*;

/// An evaluation given to a candidate: a grade, a score or a verbal label.
///
/// Integers and floats compare numerically with each other, labels compare
/// lexicographically. A number and a label cannot be compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Int(i64),
    Float(f64),
    Label(String),
}

impl Level {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Level::Label(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Level::Int(i) => Some(*i as f64),
            Level::Float(f) => Some(*f),
            Level::Label(_) => None,
        }
    }

    /// The natural comparison.
    pub fn try_cmp(&self, other: &Level) -> VotingResult<Ordering> {
        match (self, other) {
            (Level::Int(a), Level::Int(b)) => Ok(a.cmp(b)),
            (Level::Label(a), Level::Label(b)) => Ok(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).context(ScaleMismatchSnafu {
                    message: format!("cannot compare {} and {}", x, y),
                }),
                _ => ScaleMismatchSnafu {
                    message: format!("cannot compare {} and {}", a, b),
                }
                .fail(),
            },
        }
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Level) -> bool {
        matches!(self.try_cmp(other), Ok(Ordering::Equal))
    }
}

impl From<i64> for Level {
    fn from(i: i64) -> Level {
        Level::Int(i)
    }
}

impl From<f64> for Level {
    fn from(f: f64) -> Level {
        Level::Float(f)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Level {
        Level::Label(s.to_string())
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Int(i) => write!(f, "{}", i),
            Level::Float(x) => write!(f, "{:?}", x),
            Level::Label(s) => write!(f, "{}", s),
        }
    }
}

/// Sorts levels by their natural order, failing on the first incomparable pair.
pub(crate) fn sort_levels(levels: &mut [Level]) -> VotingResult<()> {
    try_sort_by(levels, |a, b| a.try_cmp(b))
}

/// Stable sort with a comparison that may fail. The first failure is returned.
pub(crate) fn try_sort_by<T, F>(items: &mut [T], mut cmp: F) -> VotingResult<()>
where
    F: FnMut(&T, &T) -> VotingResult<Ordering>,
{
    let mut failure: Option<VotingError> = None;
    items.sort_by(|a, b| match cmp(a, b) {
        Ok(o) => o,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
