use std::collections::BTreeMap;
use std::fmt::Display;

use log::debug;

use crate::config::*;
use crate::error::*;
use crate::level::{try_sort_by, Level};
use crate::parse::parse_order;
use crate::priority::Priority;
use crate::scale::Scale;

/// One voter's input, in one of the supported formats.
///
/// Ballots are immutable: restricting or converting a ballot always builds a new one.
#[derive(PartialEq, Debug, Clone)]
pub enum Ballot {
    /// A ranking with possible ties.
    Order(BallotOrder),
    /// An evaluation of the candidates on a scale.
    Levels(BallotLevels),
    /// A single name, without any specific meaning attached to it.
    OneName(BallotOneName),
    /// A single name: the candidate the voter supports.
    Plurality(BallotOneName),
    /// A single name: the candidate the voter rejects.
    Veto(BallotOneName),
}

/// The raw input of a ballot, before its format is decided.
///
/// See [`crate::converter::ConverterGeneral`] for how each case is interpreted.
#[derive(PartialEq, Debug, Clone)]
pub enum RawBallot {
    /// Already a typed ballot.
    Ballot(Ballot),
    /// A mapping from candidates to evaluations.
    Levels(BTreeMap<Candidate, Level>),
    /// Indifference classes, from the most to the least preferred.
    Order(Vec<CandidateSet>),
    /// Either an order written as "a ~ b > c", or a single name.
    Text(String),
}

impl From<Ballot> for RawBallot {
    fn from(b: Ballot) -> RawBallot {
        RawBallot::Ballot(b)
    }
}

impl From<&str> for RawBallot {
    fn from(s: &str) -> RawBallot {
        RawBallot::Text(s.to_string())
    }
}

impl From<Vec<CandidateSet>> for RawBallot {
    fn from(classes: Vec<CandidateSet>) -> RawBallot {
        RawBallot::Order(classes)
    }
}

impl From<BTreeMap<Candidate, Level>> for RawBallot {
    fn from(levels: BTreeMap<Candidate, Level>) -> RawBallot {
        RawBallot::Levels(levels)
    }
}

// Re-selection after a restriction: falls back to abstention when the priority refuses
// to break a tie.
fn choose_or_abstain(priority: Priority, candidates: &CandidateSet, reverse: bool) -> Option<Candidate> {
    match priority.choice(candidates, reverse) {
        Ok(c) => c,
        Err(e) => {
            debug!("choose_or_abstain: abstention: {}", e);
            None
        }
    }
}

// ********* Order ***********

/// A ranking: indifference classes from the most to the least preferred.
///
/// Declared candidates that appear in no class are "unordered": the voter could have
/// ranked them but did not.
#[derive(PartialEq, Debug, Clone)]
pub struct BallotOrder {
    // Invariant: non-empty, pairwise disjoint, included in `candidates`.
    classes: Vec<CandidateSet>,
    candidates: CandidateSet,
}

impl BallotOrder {
    /// Builds an order. By default the declared candidates are the ranked ones.
    pub fn new(classes: Vec<CandidateSet>, candidates: Option<CandidateSet>) -> VotingResult<BallotOrder> {
        let classes: Vec<CandidateSet> = classes.into_iter().filter(|c| !c.is_empty()).collect();
        let mut ranked = CandidateSet::new();
        for class in classes.iter() {
            for c in class.iter() {
                if !ranked.insert(c.clone()) {
                    return ConversionSnafu {
                        message: format!("candidate {:?} is ranked twice", c),
                    }
                    .fail();
                }
            }
        }
        let candidates = match candidates {
            Some(cands) => {
                if let Some(c) = ranked.difference(&cands).next() {
                    return ConversionSnafu {
                        message: format!("ranked candidate {:?} is not declared", c),
                    }
                    .fail();
                }
                cands
            }
            None => ranked,
        };
        Ok(BallotOrder { classes, candidates })
    }

    /// Parses an order written as "a ~ b > c".
    pub fn parse(text: &str, candidates: Option<CandidateSet>) -> VotingResult<BallotOrder> {
        BallotOrder::new(parse_order(text)?, candidates)
    }

    pub fn as_weak_order(&self) -> &[CandidateSet] {
        &self.classes
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn candidates_in_b(&self) -> CandidateSet {
        self.classes.iter().flatten().cloned().collect()
    }

    pub fn candidates_not_in_b(&self) -> CandidateSet {
        let in_b = self.candidates_in_b();
        self.candidates.difference(&in_b).cloned().collect()
    }

    /// The number of ranked candidates.
    pub fn len(&self) -> usize {
        self.classes.iter().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn restrict(&self, candidates: &CandidateSet) -> BallotOrder {
        BallotOrder {
            classes: self
                .classes
                .iter()
                .map(|class| class.intersection(candidates).cloned().collect::<CandidateSet>())
                .filter(|class| !class.is_empty())
                .collect(),
            candidates: self.candidates.intersection(candidates).cloned().collect(),
        }
    }

    /// The preferred candidate among `candidates` (default: all declared candidates).
    /// When no ranked candidate qualifies, the unordered ones are considered.
    ///
    /// A tie that the priority refuses to break is an `AmbiguousTie` error.
    pub fn first(&self, candidates: Option<&CandidateSet>, priority: Priority) -> VotingResult<Option<Candidate>> {
        let within = |set: &CandidateSet| -> CandidateSet {
            match candidates {
                Some(cands) => set.intersection(cands).cloned().collect(),
                None => set.clone(),
            }
        };
        for class in self.classes.iter() {
            let best = within(class);
            if !best.is_empty() {
                return priority.choice(&best, false);
            }
        }
        priority.choice(&within(&self.candidates_not_in_b()), false)
    }

    /// The least preferred candidate among `candidates`. Unordered candidates come last.
    pub fn last(&self, candidates: Option<&CandidateSet>, priority: Priority) -> VotingResult<Option<Candidate>> {
        let within = |set: &CandidateSet| -> CandidateSet {
            match candidates {
                Some(cands) => set.intersection(cands).cloned().collect(),
                None => set.clone(),
            }
        };
        let unordered = within(&self.candidates_not_in_b());
        if !unordered.is_empty() {
            return priority.choice(&unordered, true);
        }
        for class in self.classes.iter().rev() {
            let worst = within(class);
            if !worst.is_empty() {
                return priority.choice(&worst, true);
            }
        }
        Ok(None)
    }

    /// Borda points: a candidate gets one point per candidate it strictly beats, and half a
    /// point per other candidate of its own class.
    ///
    /// With `unordered_give_points`, the unordered candidates count as beaten by every
    /// ranked candidate. `unordered_receive_points` decides what they get themselves.
    pub fn borda(
        &self,
        unordered_give_points: bool,
        unordered_receive_points: PointsPolicy,
    ) -> BTreeMap<Candidate, f64> {
        let unordered = self.candidates_not_in_b();
        let n_unordered = unordered.len() as f64;
        let mut res: BTreeMap<Candidate, f64> = BTreeMap::new();
        let mut points = if unordered_give_points { n_unordered } else { 0.0 };
        for class in self.classes.iter().rev() {
            let size = class.len() as f64;
            let each = points + (size - 1.0) / 2.0;
            for c in class.iter() {
                res.insert(c.clone(), each);
            }
            points += size;
        }
        let unordered_points = match unordered_receive_points {
            PointsPolicy::Receive => Some((n_unordered - 1.0) / 2.0),
            PointsPolicy::Zero => Some(0.0),
            PointsPolicy::Ignore => None,
        };
        if let Some(p) = unordered_points {
            for c in unordered {
                res.insert(c, p);
            }
        }
        res
    }
}

impl Display for BallotOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let classes: Vec<String> = self
            .classes
            .iter()
            .map(|c| c.iter().cloned().collect::<Vec<_>>().join(" ~ "))
            .collect();
        write!(f, "{}", classes.join(" > "))
    }
}

// ********* Levels ***********

/// An evaluation of candidates on a scale (grades, scores, verbal appreciations).
#[derive(PartialEq, Debug, Clone)]
pub struct BallotLevels {
    levels: BTreeMap<Candidate, Level>,
    candidates: CandidateSet,
    scale: Scale,
}

impl BallotLevels {
    /// Builds an evaluation. Without an explicit scale, it is inferred from the values
    /// (see [`Scale::infer`]). Every value must belong to the scale.
    pub fn new(
        levels: BTreeMap<Candidate, Level>,
        candidates: Option<CandidateSet>,
        scale: Option<Scale>,
    ) -> VotingResult<BallotLevels> {
        let scale = match scale {
            Some(s) => s,
            None => Scale::infer(&levels.values().cloned().collect::<Vec<_>>())?,
        };
        scale.check()?;
        for (c, v) in levels.iter() {
            if !scale.contains(v) {
                return ScaleMismatchSnafu {
                    message: format!("level {} of candidate {:?} is not in {:?}", v, c, scale),
                }
                .fail();
            }
        }
        let candidates = match candidates {
            Some(cands) => {
                if let Some(c) = levels.keys().find(|c| !cands.contains(*c)) {
                    return ConversionSnafu {
                        message: format!("evaluated candidate {:?} is not declared", c),
                    }
                    .fail();
                }
                cands
            }
            None => levels.keys().cloned().collect(),
        };
        Ok(BallotLevels {
            levels,
            candidates,
            scale,
        })
    }

    pub fn as_dict(&self) -> &BTreeMap<Candidate, Level> {
        &self.levels
    }

    pub fn get(&self, candidate: &str) -> Option<&Level> {
        self.levels.get(candidate)
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn candidates_in_b(&self) -> CandidateSet {
        self.levels.keys().cloned().collect()
    }

    pub fn candidates_not_in_b(&self) -> CandidateSet {
        self.candidates
            .iter()
            .filter(|c| !self.levels.contains_key(*c))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// The restriction keeps the scale.
    pub fn restrict(&self, candidates: &CandidateSet) -> BallotLevels {
        BallotLevels {
            levels: self
                .levels
                .iter()
                .filter(|(c, _)| candidates.contains(*c))
                .map(|(c, v)| (c.clone(), v.clone()))
                .collect(),
            candidates: self.candidates.intersection(candidates).cloned().collect(),
            scale: self.scale.clone(),
        }
    }

    /// Candidates grouped by level, the best level first.
    pub fn as_weak_order(&self) -> VotingResult<Vec<CandidateSet>> {
        let mut distinct: Vec<Level> = Vec::new();
        for v in self.levels.values() {
            if !distinct.contains(v) {
                distinct.push(v.clone());
            }
        }
        try_sort_by(&mut distinct, |a, b| self.scale.compare(b, a))?;
        Ok(distinct
            .iter()
            .map(|v| {
                self.levels
                    .iter()
                    .filter(|(_, x)| *x == v)
                    .map(|(c, _)| c.clone())
                    .collect()
            })
            .collect())
    }

    pub fn as_order(&self) -> VotingResult<BallotOrder> {
        BallotOrder::new(self.as_weak_order()?, Some(self.candidates.clone()))
    }
}

// ********* Single names ***********

/// A ballot holding a single name, or none for an abstention.
#[derive(PartialEq, Debug, Clone)]
pub struct BallotOneName {
    candidate: Option<Candidate>,
    candidates: CandidateSet,
}

impl BallotOneName {
    /// By default the declared candidates are just the named one.
    pub fn new(candidate: Option<Candidate>, candidates: Option<CandidateSet>) -> BallotOneName {
        let mut candidates = candidates.unwrap_or_default();
        if let Some(c) = candidate.as_ref() {
            candidates.insert(c.clone());
        }
        BallotOneName {
            candidate,
            candidates,
        }
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    // When the named candidate is excluded, another one is chosen among the remaining
    // candidates, from the top of the priority or from the bottom with `reverse`.
    fn restrict_choosing(&self, candidates: &CandidateSet, priority: Priority, reverse: bool) -> BallotOneName {
        let remaining: CandidateSet = self.candidates.intersection(candidates).cloned().collect();
        let candidate = match self.candidate.as_ref() {
            None => None,
            Some(c) if remaining.contains(c) => Some(c.clone()),
            Some(_) => choose_or_abstain(priority, &remaining, reverse),
        };
        BallotOneName {
            candidate,
            candidates: remaining,
        }
    }

    fn available(&self, candidates: Option<&CandidateSet>) -> CandidateSet {
        match candidates {
            Some(cands) => self.candidates.intersection(cands).cloned().collect(),
            None => self.candidates.clone(),
        }
    }

    fn others(&self, available: &CandidateSet) -> CandidateSet {
        available
            .iter()
            .filter(|c| Some(*c) != self.candidate.as_ref())
            .cloned()
            .collect()
    }
}

// ********* Common interface ***********

impl Ballot {
    pub fn order(text: &str) -> VotingResult<Ballot> {
        Ok(Ballot::Order(BallotOrder::parse(text, None)?))
    }

    pub fn one_name(candidate: Option<&str>, candidates: Option<CandidateSet>) -> Ballot {
        Ballot::OneName(BallotOneName::new(candidate.map(|s| s.to_string()), candidates))
    }

    pub fn plurality(candidate: Option<&str>, candidates: Option<CandidateSet>) -> Ballot {
        Ballot::Plurality(BallotOneName::new(candidate.map(|s| s.to_string()), candidates))
    }

    pub fn veto(candidate: Option<&str>, candidates: Option<CandidateSet>) -> Ballot {
        Ballot::Veto(BallotOneName::new(candidate.map(|s| s.to_string()), candidates))
    }

    /// The candidates that were available to the voter.
    pub fn candidates(&self) -> &CandidateSet {
        match self {
            Ballot::Order(b) => b.candidates(),
            Ballot::Levels(b) => b.candidates(),
            Ballot::OneName(b) | Ballot::Plurality(b) | Ballot::Veto(b) => b.candidates(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Ballot::Order(_) => "order",
            Ballot::Levels(_) => "levels",
            Ballot::OneName(_) => "one name",
            Ballot::Plurality(_) => "plurality",
            Ballot::Veto(_) => "veto",
        }
    }

    /// Restricts the ballot to some candidates.
    ///
    /// Single-name ballots take a priority (default: [`Priority::DEFAULT`]) to choose a
    /// replacement when their candidate is excluded; passing a priority to an order or
    /// an evaluation is a `Restriction` error. A candidate set disjoint from the ballot
    /// gives an empty ballot, not an error.
    pub fn restrict(&self, candidates: &CandidateSet, priority: Option<Priority>) -> VotingResult<Ballot> {
        match (self, priority) {
            (Ballot::Order(_), Some(p)) | (Ballot::Levels(_), Some(p)) => RestrictionSnafu {
                message: format!(
                    "a {} ballot does not take a priority (got {:?})",
                    self.kind_name(),
                    p
                ),
            }
            .fail(),
            (Ballot::Order(b), None) => Ok(Ballot::Order(b.restrict(candidates))),
            (Ballot::Levels(b), None) => Ok(Ballot::Levels(b.restrict(candidates))),
            (Ballot::OneName(b), p) => Ok(Ballot::OneName(b.restrict_choosing(
                candidates,
                p.unwrap_or_default(),
                false,
            ))),
            (Ballot::Plurality(b), p) => Ok(Ballot::Plurality(b.restrict_choosing(
                candidates,
                p.unwrap_or_default(),
                false,
            ))),
            (Ballot::Veto(b), p) => Ok(Ballot::Veto(b.restrict_choosing(
                candidates,
                p.unwrap_or_default(),
                true,
            ))),
        }
    }

    /// The implied favourite among `candidates`.
    ///
    /// An abstention stays an abstention. A tie that the priority refuses to break is an
    /// `AmbiguousTie` error.
    pub fn first(&self, candidates: Option<&CandidateSet>, priority: Priority) -> VotingResult<Option<Candidate>> {
        match self {
            Ballot::Order(b) => b.first(candidates, priority),
            Ballot::Levels(b) => b.as_order()?.first(candidates, priority),
            Ballot::OneName(b) | Ballot::Plurality(b) => {
                let available = b.available(candidates);
                match b.candidate.as_ref() {
                    None => Ok(None),
                    Some(c) if available.contains(c) => Ok(Some(c.clone())),
                    Some(_) => priority.choice(&available, false),
                }
            }
            Ballot::Veto(b) => {
                let available = b.available(candidates);
                let others = b.others(&available);
                match b.candidate.as_ref() {
                    None => Ok(None),
                    Some(c) if others.is_empty() => Ok(Some(c.clone()).filter(|c| available.contains(c))),
                    Some(_) => priority.choice(&others, false),
                }
            }
        }
    }

    /// The implied least liked candidate among `candidates`.
    pub fn last(&self, candidates: Option<&CandidateSet>, priority: Priority) -> VotingResult<Option<Candidate>> {
        match self {
            Ballot::Order(b) => b.last(candidates, priority),
            Ballot::Levels(b) => b.as_order()?.last(candidates, priority),
            Ballot::OneName(b) | Ballot::Plurality(b) => {
                let available = b.available(candidates);
                let others = b.others(&available);
                match b.candidate.as_ref() {
                    None => Ok(None),
                    Some(c) if others.is_empty() => Ok(Some(c.clone()).filter(|c| available.contains(c))),
                    Some(_) => priority.choice(&others, true),
                }
            }
            Ballot::Veto(b) => {
                let available = b.available(candidates);
                match b.candidate.as_ref() {
                    None => Ok(None),
                    Some(c) if available.contains(c) => Ok(Some(c.clone())),
                    Some(_) => priority.choice(&available, true),
                }
            }
        }
    }

    /// The ranking expressed by an order or an evaluation.
    pub fn as_order(&self) -> VotingResult<BallotOrder> {
        match self {
            Ballot::Order(b) => Ok(b.clone()),
            Ballot::Levels(b) => b.as_order(),
            _ => ConversionSnafu {
                message: format!("a {} ballot does not express a ranking", self.kind_name()),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands(names: &[&str]) -> CandidateSet {
        candidate_set(names)
    }

    fn levels(pairs: &[(&str, Level)]) -> BTreeMap<Candidate, Level> {
        pairs
            .iter()
            .map(|(c, v)| (c.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn order_invariants() {
        let b = BallotOrder::parse("a ~ b > c", Some(cands(&["a", "b", "c", "d"]))).unwrap();
        assert_eq!(b.len(), 3);
        assert_eq!(b.candidates_not_in_b(), cands(&["d"]));
        assert_eq!(b.to_string(), "a ~ b > c");
        let undeclared = BallotOrder::parse("a > b", Some(cands(&["a"])));
        assert!(matches!(undeclared, Err(VotingError::Conversion { .. })));
        let twice = BallotOrder::new(vec![cands(&["a"]), cands(&["a", "b"])], None);
        assert!(matches!(twice, Err(VotingError::Conversion { .. })));
    }

    #[test]
    fn order_restriction_composes() {
        let b = BallotOrder::parse("a ~ b > c > d ~ e", Some(cands(&["a", "b", "c", "d", "e", "f"])))
            .unwrap();
        let s = cands(&["a", "c", "d", "f", "g"]);
        let t = cands(&["a", "b", "d", "f"]);
        let inter: CandidateSet = s.intersection(&t).cloned().collect();
        assert_eq!(b.restrict(&s).restrict(&t), b.restrict(&inter));
        assert_eq!(b.restrict(&inter).to_string(), "a > d");
        assert_eq!(b.restrict(&inter).candidates(), &cands(&["a", "d", "f"]));
    }

    #[test]
    fn order_restriction_to_disjoint_set_is_empty() {
        let b = Ballot::order("a > b").unwrap();
        let r = b.restrict(&cands(&["x"]), None).unwrap();
        assert_eq!(r.candidates(), &CandidateSet::new());
        assert!(r.as_order().unwrap().is_empty());
    }

    #[test]
    fn order_does_not_take_a_priority() {
        let b = Ballot::order("a > b").unwrap();
        let res = b.restrict(&cands(&["a"]), Some(Priority::Ascending));
        assert!(matches!(res, Err(VotingError::Restriction { .. })));
    }

    #[test]
    fn borda_points() {
        let b = BallotOrder::parse("a > b > c", Some(cands(&["a", "b", "c", "d", "e"]))).unwrap();
        let with = b.borda(true, PointsPolicy::Ignore);
        assert_eq!(with.get("a"), Some(&4.0));
        assert_eq!(with.get("c"), Some(&2.0));
        assert_eq!(with.get("d"), None);
        let without = b.borda(false, PointsPolicy::Receive);
        assert_eq!(without.get("a"), Some(&2.0));
        assert_eq!(without.get("c"), Some(&0.0));
        assert_eq!(without.get("d"), Some(&0.5));
        let tied = BallotOrder::parse("a > b ~ c", None).unwrap();
        let t = tied.borda(true, PointsPolicy::Zero);
        assert_eq!(t.get("b"), Some(&0.5));
        assert_eq!(t.get("a"), Some(&2.0));
    }

    #[test]
    fn levels_weak_order_uses_the_scale() {
        let scale = Scale::from_list(vec!["Bad", "Medium", "Good"]);
        let b = BallotLevels::new(
            levels(&[("a", "Good".into()), ("b", "Bad".into()), ("c", "Bad".into())]),
            None,
            Some(scale),
        )
        .unwrap();
        assert_eq!(
            b.as_weak_order().unwrap(),
            vec![cands(&["a"]), cands(&["b", "c"])]
        );
    }

    #[test]
    fn levels_inference_and_validation() {
        let b = BallotLevels::new(
            levels(&[("a", Level::Int(10)), ("b", Level::Int(7)), ("c", Level::Int(3))]),
            Some(cands(&["a", "b", "c", "d", "e"])),
            None,
        )
        .unwrap();
        assert_eq!(b.scale(), &Scale::range(3, 10));
        let r = b.restrict(&cands(&["b", "c", "z"]));
        assert_eq!(r.candidates(), &cands(&["b", "c"]));
        assert_eq!(r.scale(), &Scale::range(3, 10));
        let out = BallotLevels::new(
            levels(&[("a", Level::Int(11))]),
            None,
            Some(Scale::range(0, 10)),
        );
        assert!(matches!(out, Err(VotingError::ScaleMismatch { .. })));
        let inverted = BallotLevels::new(
            levels(&[("a", Level::Int(5))]),
            None,
            Some(Scale::range(10, 0)),
        );
        assert!(matches!(inverted, Err(VotingError::ScaleMismatch { .. })));
    }

    #[test]
    fn one_name_restriction_uses_priority() {
        let b = Ballot::one_name(Some("a"), Some(cands(&["a", "b", "c"])));
        let r = b.restrict(&cands(&["b", "c"]), Some(Priority::Ascending)).unwrap();
        assert_eq!(r, Ballot::one_name(Some("b"), Some(cands(&["b", "c"]))));
        let v = Ballot::veto(Some("a"), Some(cands(&["a", "b", "c"])));
        let r = v.restrict(&cands(&["b", "c"]), Some(Priority::Ascending)).unwrap();
        assert_eq!(r, Ballot::veto(Some("c"), Some(cands(&["b", "c"]))));
    }

    #[test]
    fn one_name_restriction_abstains_on_ambiguity() {
        let b = Ballot::plurality(Some("a"), Some(cands(&["a", "b", "c"])));
        let r = b.restrict(&cands(&["b", "c"]), None).unwrap();
        assert_eq!(r, Ballot::Plurality(BallotOneName::new(None, Some(cands(&["b", "c"])))));
        let kept = b.restrict(&cands(&["a", "b"]), None).unwrap();
        assert_eq!(kept, Ballot::plurality(Some("a"), Some(cands(&["a", "b"]))));
        let single = b.restrict(&cands(&["c"]), None).unwrap();
        assert_eq!(single, Ballot::plurality(Some("c"), Some(cands(&["c"]))));
    }

    #[test]
    fn first_and_last() {
        let b = Ballot::order("a > b ~ c").unwrap();
        assert_eq!(b.first(None, Priority::Unambiguous).unwrap(), Some("a".to_string()));
        assert_eq!(b.last(None, Priority::Ascending).unwrap(), Some("c".to_string()));
        assert!(matches!(
            b.last(None, Priority::Unambiguous),
            Err(VotingError::AmbiguousTie { .. })
        ));
        let tied_top = BallotOrder::parse("a ~ b > c", None).unwrap();
        assert!(matches!(
            tied_top.first(None, Priority::Unambiguous),
            Err(VotingError::AmbiguousTie { .. })
        ));
        assert_eq!(
            tied_top.first(Some(&cands(&["b", "c"])), Priority::Unambiguous).unwrap(),
            Some("b".to_string())
        );
        assert_eq!(Ballot::plurality(None, Some(cands(&["a", "b"]))).first(None, Priority::Unambiguous).unwrap(), None);
        let v = Ballot::veto(Some("a"), Some(cands(&["a", "b"])));
        assert_eq!(v.first(None, Priority::Unambiguous).unwrap(), Some("b".to_string()));
        assert_eq!(v.last(None, Priority::Unambiguous).unwrap(), Some("a".to_string()));
        let o = Ballot::one_name(Some("a"), Some(cands(&["a", "b"])));
        assert_eq!(o.last(None, Priority::Unambiguous).unwrap(), Some("b".to_string()));
    }
}
