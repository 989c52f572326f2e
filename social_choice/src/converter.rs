use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use crate::ballot::*;
use crate::config::*;
use crate::error::*;
use crate::level::Level;
use crate::parse::parse_order;
use crate::priority::Priority;
use crate::scale::Scale;

/// Turns raw input into ballots of a given shape.
///
/// All converters are pure: they never modify their input, and converting the same
/// input twice gives the same ballot.
#[derive(PartialEq, Debug, Clone)]
pub enum Converter {
    General(ConverterGeneral),
    ToOrder(ConverterToOrder),
    ToLevels(ConverterToLevels),
    ToPlurality(ConverterToPlurality),
    ToVeto(ConverterToVeto),
}

impl Converter {
    /// Converts the input, then restricts it to `candidates` when they are given.
    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<Ballot> {
        match self {
            Converter::General(c) => c.convert(x, candidates),
            Converter::ToOrder(c) => Ok(Ballot::Order(c.convert(x, candidates)?)),
            Converter::ToLevels(c) => Ok(Ballot::Levels(c.convert(x, candidates)?)),
            Converter::ToPlurality(c) => c.convert(x, candidates),
            Converter::ToVeto(c) => c.convert(x, candidates),
        }
    }
}

impl Default for Converter {
    fn default() -> Converter {
        Converter::General(ConverterGeneral::DEFAULT)
    }
}

// ********* General ***********

/// Guesses what kind of ballot the voter meant.
///
/// - a typed ballot is kept, and restricted with the priority matching its variant;
/// - a mapping is an evaluation ([`BallotLevels`], with an inferred scale);
/// - a list of classes or a text that parses as an order is an order, except when it
///   names exactly one candidate, which makes it a single name;
/// - a text that does not parse is taken as one candidate name.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterGeneral {
    pub plurality_priority: Priority,
    pub veto_priority: Priority,
    pub one_name_priority: Priority,
}

impl ConverterGeneral {
    pub const DEFAULT: ConverterGeneral = ConverterGeneral {
        plurality_priority: Priority::DEFAULT,
        veto_priority: Priority::DEFAULT,
        one_name_priority: Priority::DEFAULT,
    };

    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<Ballot> {
        let ballot = match x {
            RawBallot::Ballot(b) => b.clone(),
            RawBallot::Levels(levels) => Ballot::Levels(BallotLevels::new(levels.clone(), None, None)?),
            RawBallot::Order(classes) => order_or_one_name(BallotOrder::new(classes.clone(), None)?),
            RawBallot::Text(text) => match parse_order(text) {
                Ok(classes) => order_or_one_name(BallotOrder::new(classes, None)?),
                Err(e) => {
                    debug!("convert: {:?} is read as a single name: {}", text, e);
                    Ballot::one_name(Some(text.as_str()), None)
                }
            },
        };
        match candidates {
            None => Ok(ballot),
            Some(cands) => self.restrict(&ballot, cands),
        }
    }

    fn restrict(&self, ballot: &Ballot, candidates: &CandidateSet) -> VotingResult<Ballot> {
        let priority = match ballot {
            Ballot::Order(_) | Ballot::Levels(_) => None,
            Ballot::Plurality(_) => Some(self.plurality_priority),
            Ballot::Veto(_) => Some(self.veto_priority),
            Ballot::OneName(_) => Some(self.one_name_priority),
        };
        ballot.restrict(candidates, priority)
    }
}

impl Default for ConverterGeneral {
    fn default() -> ConverterGeneral {
        ConverterGeneral::DEFAULT
    }
}

/// An order that ranks a single candidate is read as that name. The declared candidates
/// are kept.
pub fn order_or_one_name(order: BallotOrder) -> Ballot {
    if order.len() == 1 {
        let name = order.candidates_in_b().into_iter().next();
        Ballot::OneName(BallotOneName::new(name, Some(order.candidates().clone())))
    } else {
        Ballot::Order(order)
    }
}

// Every specialized converter starts from the general interpretation, without restriction.
fn interpret(x: &RawBallot) -> VotingResult<Ballot> {
    ConverterGeneral::DEFAULT.convert(x, None)
}

fn restricted(candidates: &CandidateSet, within: Option<&CandidateSet>) -> CandidateSet {
    match within {
        Some(cands) => candidates.intersection(cands).cloned().collect(),
        None => candidates.clone(),
    }
}

// ********* Order ***********

/// Converts to a ranking.
///
/// An evaluation gives its weak order; a single name is ranked alone above nothing; a veto
/// ranks every other candidate above the vetoed one.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConverterToOrder {}

impl ConverterToOrder {
    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<BallotOrder> {
        let order = match interpret(x)? {
            Ballot::Order(b) => b,
            Ballot::Levels(b) => b.as_order()?,
            Ballot::OneName(b) | Ballot::Plurality(b) => {
                let classes = b
                    .candidate()
                    .map(|c| vec![candidate_set(&[c])])
                    .unwrap_or_default();
                BallotOrder::new(classes, Some(b.candidates().clone()))?
            }
            Ballot::Veto(b) => {
                let classes = match b.candidate() {
                    None => vec![],
                    Some(c) => {
                        let others: CandidateSet = b.candidates().iter().filter(|x| *x != c).cloned().collect();
                        vec![others, candidate_set(&[c])]
                    }
                };
                BallotOrder::new(classes, Some(b.candidates().clone()))?
            }
        };
        Ok(match candidates {
            Some(cands) => order.restrict(cands),
            None => order,
        })
    }
}

// ********* Levels ***********

/// Converts to an evaluation on a target scale.
///
/// - a single name gives the top of the scale to its candidate and the bottom to the
///   others (the reverse for a veto), an abstention gives an empty evaluation;
/// - an evaluation is mapped affinely from its own scale to the target;
/// - an order is first converted to Borda points, then mapped affinely.
///
/// Integer ranges round the result (half to even), numeric lists snap it to the nearest
/// level and label lists go through the ranks `0..n-1`. An evaluation whose values are
/// all levels of a discrete target is only relabeled on it. Without a target scale, an
/// evaluation is only restricted and anything else goes to [`Self::DEFAULT_SCALE`].
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterToLevels {
    pub scale: Option<Scale>,
    pub borda_unordered_give_points: bool,
}

impl ConverterToLevels {
    pub const DEFAULT_SCALE: Scale = Scale::Interval { low: 0.0, high: 1.0 };

    pub fn new(scale: Option<Scale>) -> ConverterToLevels {
        ConverterToLevels {
            scale,
            borda_unordered_give_points: true,
        }
    }

    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<BallotLevels> {
        if let Some(s) = self.scale.as_ref() {
            s.check()?;
        }
        let ballot = interpret(x)?;
        let target = match (&self.scale, &ballot) {
            (None, Ballot::Levels(b)) => return Ok(restrict_levels(b, candidates)),
            (None, _) => ConverterToLevels::DEFAULT_SCALE,
            (Some(s), Ballot::Levels(b)) if b.scale() == s => return Ok(restrict_levels(b, candidates)),
            (Some(s), Ballot::Levels(b)) if is_relabeling(s) && b.as_dict().values().all(|v| s.contains(v)) => {
                let relabeled = BallotLevels::new(b.as_dict().clone(), Some(b.candidates().clone()), Some(s.clone()))?;
                return Ok(restrict_levels(&relabeled, candidates));
            }
            (Some(s), _) => s.clone(),
        };
        let (values, cands) = self.to_target(&ballot, &target)?;
        let levels = BallotLevels::new(values, Some(cands), Some(target))?;
        Ok(restrict_levels(&levels, candidates))
    }

    fn to_target(&self, ballot: &Ballot, target: &Scale) -> VotingResult<(BTreeMap<Candidate, Level>, CandidateSet)> {
        match target {
            Scale::Interval { low, high } => {
                let (values, cands) = self.to_interval(ballot, *low, *high)?;
                Ok((values.into_iter().map(|(c, v)| (c, Level::Float(v))).collect(), cands))
            }
            Scale::Range { low, high } => {
                let (values, cands) = self.to_interval(ballot, *low as f64, *high as f64)?;
                Ok((values.into_iter().map(|(c, v)| (c, Level::Int(round_level(v)))).collect(), cands))
            }
            Scale::FromList { .. } | Scale::FromSet { .. } => {
                let levels = target.levels().unwrap_or_default();
                if levels.is_empty() {
                    return ConversionSnafu {
                        message: format!("cannot convert to the empty scale {:?}", target),
                    }
                    .fail();
                }
                if target.is_numeric() {
                    let numbers: Vec<f64> = levels.iter().filter_map(|l| l.as_f64()).collect();
                    let low = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
                    let high = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    let (values, cands) = self.to_interval(ballot, low, high)?;
                    Ok((
                        values.into_iter().map(|(c, v)| (c, nearest_level(&levels, v))).collect(),
                        cands,
                    ))
                } else {
                    let top = (levels.len() - 1) as f64;
                    let (values, cands) = self.to_interval(ballot, 0.0, top)?;
                    Ok((
                        values
                            .into_iter()
                            .map(|(c, v)| {
                                let rank = (round_level(v).max(0) as usize).min(levels.len() - 1);
                                (c, levels[rank].clone())
                            })
                            .collect(),
                        cands,
                    ))
                }
            }
            Scale::Natural => ConversionSnafu {
                message: "cannot convert to an unbounded scale",
            }
            .fail(),
        }
    }

    // The core of all the conversions: values as floats in [low, high].
    fn to_interval(&self, ballot: &Ballot, low: f64, high: f64) -> VotingResult<(BTreeMap<Candidate, f64>, CandidateSet)> {
        let affine = |x: f64, x_low: f64, x_high: f64| -> f64 {
            if x_high == x_low {
                high
            } else {
                (low + (high - low) * (x - x_low) / (x_high - x_low)).max(low).min(high)
            }
        };
        let values: BTreeMap<Candidate, f64> = match ballot {
            Ballot::Veto(b) => extremes(b, high, low),
            Ballot::OneName(b) | Ballot::Plurality(b) => extremes(b, low, high),
            Ballot::Levels(b) => {
                let scale = if b.scale().is_bounded() {
                    b.scale().clone()
                } else if let Some(values) = within(b, low, high) {
                    return Ok((values, ballot.candidates().clone()));
                } else {
                    source_scale(b)?
                };
                let mut res = BTreeMap::new();
                match (scale.low().and_then(|l| l.as_f64()), scale.high().and_then(|h| h.as_f64())) {
                    (Some(x_low), Some(x_high)) if scale.is_numeric() => {
                        for (c, v) in b.as_dict().iter() {
                            let x = v.as_f64().context(ScaleMismatchSnafu {
                                message: format!("{} is not a number", v),
                            })?;
                            res.insert(c.clone(), affine(x, x_low, x_high));
                        }
                    }
                    _ => {
                        let top = scale.levels().map_or(0, |l| l.len().saturating_sub(1)) as f64;
                        for (c, v) in b.as_dict().iter() {
                            let rank = scale.index_of(v).context(ScaleMismatchSnafu {
                                message: format!("{} is not a level of {:?}", v, scale),
                            })?;
                            res.insert(c.clone(), affine(rank as f64, 0.0, top));
                        }
                    }
                }
                res
            }
            Ballot::Order(b) => {
                let borda = b.borda(self.borda_unordered_give_points, PointsPolicy::Ignore);
                let score_max = if self.borda_unordered_give_points {
                    b.candidates().len()
                } else {
                    b.len()
                }
                .saturating_sub(1) as f64;
                borda
                    .into_iter()
                    .map(|(c, points)| (c, affine(points, 0.0, score_max)))
                    .collect()
            }
        };
        Ok((values, ballot.candidates().clone()))
    }
}

impl Default for ConverterToLevels {
    fn default() -> ConverterToLevels {
        ConverterToLevels::new(None)
    }
}

// Labels that are already levels of a discrete target keep their meaning. Numbers are
// always rescaled from their own scale.
fn is_relabeling(scale: &Scale) -> bool {
    matches!(scale, Scale::FromList { .. } | Scale::FromSet { .. }) && !scale.is_numeric()
}

fn restrict_levels(b: &BallotLevels, candidates: Option<&CandidateSet>) -> BallotLevels {
    match candidates {
        Some(cands) => b.restrict(cands),
        None => b.clone(),
    }
}

fn extremes(b: &BallotOneName, named: f64, others: f64) -> BTreeMap<Candidate, f64> {
    match b.candidate() {
        None => BTreeMap::new(),
        Some(name) => b
            .candidates()
            .iter()
            .map(|c| (c.clone(), if c == name { named } else { others }))
            .collect(),
    }
}

// The scale to map an unbounded evaluation from: numbers span their extreme values,
// labels are taken in their natural order.
fn source_scale(b: &BallotLevels) -> VotingResult<Scale> {
    let values: Vec<Level> = b.as_dict().values().cloned().collect();
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if numbers.len() == values.len() {
        let x_low = numbers.iter().cloned().fold(f64::INFINITY, f64::min);
        let x_high = numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(Scale::interval(x_low, x_high))
    } else {
        Scale::from_set(values)
    }
}

// Numeric values of an unbounded evaluation that already fit in the target are kept.
fn within(b: &BallotLevels, low: f64, high: f64) -> Option<BTreeMap<Candidate, f64>> {
    let mut res = BTreeMap::new();
    for (c, v) in b.as_dict().iter() {
        match v.as_f64() {
            Some(x) if low <= x && x <= high => {
                res.insert(c.clone(), x);
            }
            _ => return None,
        }
    }
    Some(res)
}

fn round_level(x: f64) -> i64 {
    x.round_ties_even() as i64
}

fn nearest_level(levels: &[Level], x: f64) -> Level {
    let mut best: Option<(f64, &Level)> = None;
    for l in levels.iter() {
        if let Some(v) = l.as_f64() {
            let d = (v - x).abs();
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, l));
            }
        }
    }
    best.map_or(Level::Float(x), |(_, l)| l.clone())
}

// ********* Plurality ***********

/// Converts to a plurality ballot: the favourite candidate of the voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterToPlurality {
    pub order_priority: Priority,
    pub plurality_priority: Priority,
    pub veto_priority: Priority,
    pub one_name_priority: Priority,
}

impl ConverterToPlurality {
    pub const DEFAULT: ConverterToPlurality = ConverterToPlurality {
        order_priority: Priority::DEFAULT,
        plurality_priority: Priority::DEFAULT,
        veto_priority: Priority::DEFAULT,
        one_name_priority: Priority::DEFAULT,
    };

    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<Ballot> {
        let ballot = interpret(x)?;
        match &ballot {
            Ballot::Plurality(_) => ballot.restrict(candidates.unwrap_or(ballot.candidates()), Some(self.plurality_priority)),
            Ballot::Veto(b) => {
                let first = ballot.first(candidates, self.veto_priority)?;
                Ok(Ballot::Plurality(BallotOneName::new(first, Some(restricted(b.candidates(), candidates)))))
            }
            Ballot::OneName(b) => Ballot::Plurality(b.clone())
                .restrict(candidates.unwrap_or(b.candidates()), Some(self.one_name_priority)),
            Ballot::Order(_) | Ballot::Levels(_) => {
                let order = ballot.as_order()?;
                let order = match candidates {
                    Some(cands) => order.restrict(cands),
                    None => order,
                };
                let first = order.first(None, self.order_priority)?;
                Ok(Ballot::Plurality(BallotOneName::new(first, Some(order.candidates().clone()))))
            }
        }
    }
}

impl Default for ConverterToPlurality {
    fn default() -> ConverterToPlurality {
        ConverterToPlurality::DEFAULT
    }
}

// ********* Veto ***********

/// Converts to a veto ballot: the least liked candidate of the voter.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterToVeto {
    pub order_priority: Priority,
    pub plurality_priority: Priority,
    pub veto_priority: Priority,
    pub one_name_priority: Priority,
}

impl ConverterToVeto {
    pub const DEFAULT: ConverterToVeto = ConverterToVeto {
        order_priority: Priority::DEFAULT,
        plurality_priority: Priority::DEFAULT,
        veto_priority: Priority::DEFAULT,
        one_name_priority: Priority::DEFAULT,
    };

    pub fn convert(&self, x: &RawBallot, candidates: Option<&CandidateSet>) -> VotingResult<Ballot> {
        let ballot = interpret(x)?;
        match &ballot {
            Ballot::Veto(b) => ballot.restrict(candidates.unwrap_or(b.candidates()), Some(self.veto_priority)),
            Ballot::OneName(b) | Ballot::Plurality(b) => {
                let priority = if matches!(ballot, Ballot::Plurality(_)) {
                    self.plurality_priority
                } else {
                    self.one_name_priority
                };
                let last = ballot.last(candidates, priority)?;
                Ok(Ballot::Veto(BallotOneName::new(last, Some(restricted(b.candidates(), candidates)))))
            }
            Ballot::Order(_) | Ballot::Levels(_) => {
                let order = ballot.as_order()?;
                let order = match candidates {
                    Some(cands) => order.restrict(cands),
                    None => order,
                };
                let last = order.last(None, self.order_priority)?;
                Ok(Ballot::Veto(BallotOneName::new(last, Some(order.candidates().clone()))))
            }
        }
    }
}

impl Default for ConverterToVeto {
    fn default() -> ConverterToVeto {
        ConverterToVeto::DEFAULT
    }
}
