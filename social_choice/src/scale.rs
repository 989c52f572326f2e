use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::error::*;
use crate::level::{sort_levels, try_sort_by, Level};

/// The ordered space in which levels (grades, evaluations, scores) live.
///
/// All the operations agree with a single total preorder over the domain of the scale.
/// `FromList` compares its labels by position in the list; the other scales use the
/// natural order of [`Level`].
///
/// Bounds are checked when a scale is read from JSON: an interval or a range whose low
/// bound is above its high bound is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", try_from = "ScaleRepr")]
pub enum Scale {
    /// A continuous, bounded interval of floats.
    Interval { low: f64, high: f64 },
    /// A bounded range of integers.
    Range { low: i64, high: i64 },
    /// Ordered labels, from the worst to the best.
    FromList { levels: Vec<Level> },
    /// A set of values ordered naturally. Bounded unless empty.
    FromSet { levels: Vec<Level> },
    /// Any value, ordered naturally. Unbounded.
    Natural,
}

// The unchecked shape of a scale in JSON.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ScaleRepr {
    Interval { low: f64, high: f64 },
    Range { low: i64, high: i64 },
    FromList { levels: Vec<Level> },
    FromSet { levels: Vec<Level> },
    Natural,
}

impl TryFrom<ScaleRepr> for Scale {
    type Error = VotingError;

    fn try_from(repr: ScaleRepr) -> VotingResult<Scale> {
        let scale = match repr {
            ScaleRepr::Interval { low, high } => Scale::Interval { low, high },
            ScaleRepr::Range { low, high } => Scale::Range { low, high },
            ScaleRepr::FromList { levels } => Scale::FromList { levels },
            ScaleRepr::FromSet { levels } => Scale::from_set(levels)?,
            ScaleRepr::Natural => Scale::Natural,
        };
        scale.check()?;
        Ok(scale)
    }
}

impl Default for Scale {
    fn default() -> Scale {
        Scale::Natural
    }
}

impl Scale {
    pub fn interval(low: f64, high: f64) -> Scale {
        Scale::Interval { low, high }
    }

    pub fn range(low: i64, high: i64) -> Scale {
        Scale::Range { low, high }
    }

    pub fn from_list<L: Into<Level>>(levels: Vec<L>) -> Scale {
        Scale::FromList {
            levels: levels.into_iter().map(|l| l.into()).collect(),
        }
    }

    /// Builds a set scale. The values are sorted and deduplicated, which requires
    /// them to be mutually comparable.
    pub fn from_set<L: Into<Level>>(levels: Vec<L>) -> VotingResult<Scale> {
        let mut levels: Vec<Level> = levels.into_iter().map(|l| l.into()).collect();
        sort_levels(&mut levels)?;
        levels.dedup();
        Ok(Scale::FromSet { levels })
    }

    /// Fails with `ScaleMismatch` when the bounds of an interval or a range are inverted,
    /// or when a bound of an interval is not a number.
    pub fn check(&self) -> VotingResult<()> {
        let valid = match self {
            Scale::Interval { low, high } => low <= high,
            Scale::Range { low, high } => low <= high,
            _ => true,
        };
        if valid {
            Ok(())
        } else {
            ScaleMismatchSnafu {
                message: format!("the bounds of {:?} are inverted", self),
            }
            .fail()
        }
    }

    /// Guesses the scale of some evaluations: all integers gives a range, all
    /// numbers an interval, anything else a set.
    pub fn infer(values: &[Level]) -> VotingResult<Scale> {
        if values.is_empty() {
            return Ok(Scale::FromSet { levels: vec![] });
        }
        let mut sorted = values.to_vec();
        sort_levels(&mut sorted)?;
        let (low, high) = (&sorted[0], &sorted[sorted.len() - 1]);
        if values.iter().all(|v| matches!(v, Level::Int(_))) {
            if let (Level::Int(l), Level::Int(h)) = (low, high) {
                return Ok(Scale::Range { low: *l, high: *h });
            }
        }
        if values.iter().all(|v| v.is_numeric()) {
            if let (Some(l), Some(h)) = (low.as_f64(), high.as_f64()) {
                return Ok(Scale::Interval { low: l, high: h });
            }
        }
        Scale::from_set(sorted)
    }

    pub fn is_bounded(&self) -> bool {
        match self {
            Scale::Interval { .. } | Scale::Range { .. } => true,
            Scale::FromList { levels } | Scale::FromSet { levels } => !levels.is_empty(),
            Scale::Natural => false,
        }
    }

    /// True when every level of the scale is a number.
    pub fn is_numeric(&self) -> bool {
        match self {
            Scale::Interval { .. } | Scale::Range { .. } => true,
            Scale::FromList { levels } | Scale::FromSet { levels } => {
                !levels.is_empty() && levels.iter().all(|l| l.is_numeric())
            }
            Scale::Natural => false,
        }
    }

    pub fn low(&self) -> Option<Level> {
        match self {
            Scale::Interval { low, .. } => Some(Level::Float(*low)),
            Scale::Range { low, .. } => Some(Level::Int(*low)),
            Scale::FromList { levels } => levels.first().cloned(),
            Scale::FromSet { levels } => self.min(levels).ok().flatten(),
            Scale::Natural => None,
        }
    }

    pub fn high(&self) -> Option<Level> {
        match self {
            Scale::Interval { high, .. } => Some(Level::Float(*high)),
            Scale::Range { high, .. } => Some(Level::Int(*high)),
            Scale::FromList { levels } => levels.last().cloned(),
            Scale::FromSet { levels } => self.max(levels).ok().flatten(),
            Scale::Natural => None,
        }
    }

    /// The levels of a discrete scale, from the worst to the best.
    pub fn levels(&self) -> Option<Vec<Level>> {
        match self {
            Scale::FromList { levels } => Some(levels.clone()),
            Scale::FromSet { levels } => {
                let mut sorted = levels.clone();
                sort_levels(&mut sorted).ok()?;
                sorted.dedup();
                Some(sorted)
            }
            _ => None,
        }
    }

    /// The 0-based rank of a level in a discrete scale.
    pub fn index_of(&self, level: &Level) -> Option<usize> {
        match self {
            Scale::FromList { levels } => levels.iter().position(|l| l == level),
            Scale::FromSet { .. } => self.levels()?.iter().position(|l| l == level),
            _ => None,
        }
    }

    pub fn contains(&self, level: &Level) -> bool {
        match (self, level) {
            (Scale::Interval { low, high }, l) => match l.as_f64() {
                Some(x) => *low <= x && x <= *high,
                None => false,
            },
            (Scale::Range { low, high }, Level::Int(i)) => low <= i && i <= high,
            (Scale::Range { .. }, _) => false,
            (Scale::FromList { levels }, l) | (Scale::FromSet { levels }, l) => {
                levels.iter().any(|x| x == l)
            }
            (Scale::Natural, _) => true,
        }
    }

    pub fn compare(&self, one: &Level, another: &Level) -> VotingResult<Ordering> {
        match self {
            Scale::FromList { levels } => {
                let rank = |l: &Level| {
                    levels
                        .iter()
                        .position(|x| x == l)
                        .context(ScaleMismatchSnafu {
                            message: format!("{} is not a level of {:?}", l, levels),
                        })
                };
                Ok(rank(one)?.cmp(&rank(another)?))
            }
            _ => one.try_cmp(another),
        }
    }

    pub fn lt(&self, one: &Level, another: &Level) -> VotingResult<bool> {
        Ok(self.compare(one, another)? == Ordering::Less)
    }

    pub fn gt(&self, one: &Level, another: &Level) -> VotingResult<bool> {
        Ok(self.compare(one, another)? == Ordering::Greater)
    }

    pub fn min(&self, values: &[Level]) -> VotingResult<Option<Level>> {
        let mut best: Option<&Level> = None;
        for v in values.iter() {
            best = match best {
                Some(b) if !self.lt(v, b)? => Some(b),
                _ => Some(v),
            };
        }
        Ok(best.cloned())
    }

    pub fn max(&self, values: &[Level]) -> VotingResult<Option<Level>> {
        let mut best: Option<&Level> = None;
        for v in values.iter() {
            best = match best {
                Some(b) if !self.gt(v, b)? => Some(b),
                _ => Some(v),
            };
        }
        Ok(best.cloned())
    }

    /// Sorts the values in place, from the worst to the best.
    pub fn sort(&self, values: &mut [Level]) -> VotingResult<()> {
        try_sort_by(values, |a, b| self.compare(a, b))
    }

    /// The permutation that sorts the values (stable).
    pub fn argsort(&self, values: &[Level]) -> VotingResult<Vec<usize>> {
        let mut indexes: Vec<usize> = (0..values.len()).collect();
        try_sort_by(&mut indexes, |i, j| self.compare(&values[*i], &values[*j]))?;
        Ok(indexes)
    }
}
