use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{debug, info};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use snafu::OptionExt;

use crate::ballot::RawBallot;
use crate::config::*;
use crate::converter::*;
use crate::error::*;
use crate::level::{try_sort_by, Level};
use crate::matrix::*;
use crate::priority::Priority;
use crate::profile::*;
use crate::scale::Scale;
use crate::scorer::*;

/// A voting rule: how to aggregate a profile into a weak order over the candidates, and
/// how to break the ties of that order.
///
/// ```
/// use social_choice::*;
///
/// let rule = Rule::plurality();
/// let outcome = rule.load_ballots(vec!["a".into(), "a".into(), "b".into(), "c > b".into()], None, None, None)?;
/// assert_eq!(outcome.winner()?, Some("a".to_string()));
/// assert_eq!(outcome.order()[1], candidate_set(&["b", "c"]));
/// # Ok::<(), VotingError>(())
/// ```
#[derive(PartialEq, Debug, Clone)]
pub struct Rule {
    pub tie_break: Priority,
    pub kind: RuleKind,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RuleKind {
    /// Weighted sum of the scores of the ballots.
    ScoreSum(RuleScoreSum),
    /// Weighted average of the scores that are counted.
    ScoreAverage(RuleScoreAverage),
    MajorityJudgment(RuleMajorityJudgment),
    /// The Condorcet winner if there is one, then all the others.
    Condorcet(RuleCondorcet),
    /// The score of a candidate is the sum of its negative coefficients in the
    /// antisymmetric weighted majority matrix.
    SimplifiedDodgson(RuleSimplifiedDodgson),
    /// The order of the first rule, its ties broken by the second rule, and so on.
    SequentialTieBreak(Vec<Rule>),
    IteratedElimination(RuleIteratedElimination),
}

#[derive(PartialEq, Debug, Clone)]
pub struct RuleScoreSum {
    pub converter: Converter,
    pub scorer: Scorer,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RuleScoreAverage {
    pub converter: Converter,
    pub scorer: Scorer,
    /// The average of a candidate for which no score was counted.
    pub default_average: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RuleMajorityJudgment {
    pub converter: Converter,
    pub scorer: Scorer,
    /// The median of a candidate that received no evaluation at all. `None` is below any
    /// level.
    pub default_median: Option<Level>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct RuleCondorcet {
    pub matrix: MatrixMajority,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RuleSimplifiedDodgson {
    pub matrix: MatrixWeightedMajority,
}

impl Default for RuleSimplifiedDodgson {
    fn default() -> RuleSimplifiedDodgson {
        RuleSimplifiedDodgson {
            matrix: MatrixWeightedMajority::antisymmetric(),
        }
    }
}

/// Runs the base rule on the remaining candidates, eliminates some of them, and starts
/// again until no candidate remains. The candidates eliminated last are the best ones.
#[derive(PartialEq, Debug, Clone)]
pub struct RuleIteratedElimination {
    pub base_rule: Box<Rule>,
    pub elimination: Elimination,
    /// Whether the base rule uses the tie-break of this rule.
    pub propagate_tie_break: bool,
}

/// Which candidates leave the election after a round.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Elimination {
    /// The candidates whose score is strictly below the average score. When there is
    /// none, all the candidates are eliminated.
    BelowAverage,
    /// The last `k` candidates of the strict order of the round.
    Last(usize),
}

/// The score of a candidate: a number, or the (median, first, second) triple of
/// Majority Judgment.
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Judgment(Option<Level>, f64, f64),
}

impl Score {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Score::Number(x) => Some(*x),
            Score::Judgment(..) => None,
        }
    }
}

// ********* Constructors ***********

impl Rule {
    pub fn new(kind: RuleKind) -> Rule {
        Rule {
            tie_break: Priority::DEFAULT,
            kind,
        }
    }

    pub fn with_tie_break(self, tie_break: Priority) -> Rule {
        Rule {
            tie_break,
            kind: self.kind,
        }
    }

    fn score_sum(converter: Converter, scorer: Scorer) -> Rule {
        Rule::new(RuleKind::ScoreSum(RuleScoreSum { converter, scorer }))
    }

    /// One point per ballot naming the candidate first.
    pub fn plurality() -> Rule {
        Rule::score_sum(
            Converter::ToPlurality(ConverterToPlurality::DEFAULT),
            Scorer::Plurality(ScorerPlurality::default()),
        )
    }

    /// Minus one point per ballot naming the candidate last.
    pub fn veto() -> Rule {
        Rule::score_sum(
            Converter::ToVeto(ConverterToVeto::DEFAULT),
            Scorer::Veto(ScorerVeto::default()),
        )
    }

    pub fn borda() -> Rule {
        Rule::score_sum(
            Converter::ToOrder(ConverterToOrder::default()),
            Scorer::Borda(ScorerBorda::default()),
        )
    }

    pub fn bucklin(k: usize) -> Rule {
        Rule::score_sum(
            Converter::ToOrder(ConverterToOrder::default()),
            Scorer::Bucklin(ScorerBucklin::new(k)),
        )
    }

    /// Average evaluation, the ballots being converted to `scale`. Without a scale,
    /// evaluations are read as they are and other ballots are converted to `[0, 1]`.
    pub fn range_voting(scale: Option<Scale>) -> Rule {
        Rule::new(RuleKind::ScoreAverage(RuleScoreAverage {
            converter: Converter::ToLevels(ConverterToLevels::new(scale.clone())),
            scorer: Scorer::Levels(ScorerLevels::new(scale.unwrap_or_default())),
            default_average: 0.0,
        }))
    }

    /// Majority Judgment. Without a scale, evaluations are read as they are and other
    /// ballots are converted to `[0, 1]`.
    pub fn majority_judgment(scale: Option<Scale>) -> Rule {
        let converter = ConverterToLevels::new(scale.clone());
        Rule::new(RuleKind::MajorityJudgment(RuleMajorityJudgment {
            converter: Converter::ToLevels(converter),
            scorer: Scorer::Levels(ScorerLevels::new(scale.unwrap_or_default())),
            default_median: None,
        }))
    }

    pub fn condorcet() -> Rule {
        Rule::new(RuleKind::Condorcet(RuleCondorcet::default()))
    }

    pub fn simplified_dodgson() -> Rule {
        Rule::new(RuleKind::SimplifiedDodgson(RuleSimplifiedDodgson::default()))
    }

    /// Black's rule: the Condorcet winner, then the Borda order.
    pub fn black() -> Rule {
        Rule::new(RuleKind::SequentialTieBreak(vec![Rule::condorcet(), Rule::borda()]))
    }

    pub fn iterated_elimination(base_rule: Rule, elimination: Elimination) -> Rule {
        Rule::new(RuleKind::IteratedElimination(RuleIteratedElimination {
            base_rule: Box::new(base_rule),
            elimination,
            propagate_tie_break: true,
        }))
    }

    /// Kim-Roush: eliminates the candidates whose veto score is below average.
    pub fn kim_roush() -> Rule {
        Rule::iterated_elimination(Rule::veto(), Elimination::BelowAverage)
    }

    /// Instant-runoff voting: eliminates the plurality loser.
    pub fn irv() -> Rule {
        Rule::iterated_elimination(Rule::plurality(), Elimination::Last(1))
    }

    /// Nanson: eliminates the candidates whose Borda score is below average.
    pub fn nanson() -> Rule {
        Rule::iterated_elimination(Rule::borda(), Elimination::BelowAverage)
    }
}

// ********* Evaluation ***********

impl Rule {
    /// Builds the profile, then evaluates it.
    pub fn load_ballots(
        &self,
        ballots: Vec<RawBallot>,
        weights: Option<Vec<f64>>,
        voters: Option<Vec<String>>,
        candidates: Option<&CandidateSet>,
    ) -> VotingResult<RuleOutcome> {
        let profile = Profile::new(ballots, weights, voters)?;
        self.load(&profile, candidates)
    }

    /// Evaluates a profile. Without `candidates`, the election is about all the
    /// candidates of the ballots.
    pub fn load(&self, profile: &Profile, candidates: Option<&CandidateSet>) -> VotingResult<RuleOutcome> {
        let outcome = match &self.kind {
            RuleKind::ScoreSum(r) => {
                let loaded = load_profile(profile, &r.converter, candidates)?;
                let scores = sum_scores(&loaded, &r.scorer)?;
                self.scored(loaded, scores)?
            }
            RuleKind::ScoreAverage(r) => {
                let loaded = load_profile(profile, &r.converter, candidates)?;
                let scores = average_scores(&loaded, &r.scorer, r.default_average)?;
                self.scored(loaded, scores)?
            }
            RuleKind::MajorityJudgment(r) => {
                let loaded = load_profile(profile, &r.converter, candidates)?;
                r.outcome(self.tie_break, loaded)?
            }
            RuleKind::Condorcet(r) => {
                let matrix = r.matrix.load(profile, candidates)?;
                let candidates = matrix.candidates().clone();
                let winners: CandidateSet = candidates
                    .iter()
                    .filter(|c| {
                        candidates
                            .iter()
                            .filter(|d| d != c)
                            .all(|d| matrix.get(c, d) == Some(r.matrix.greater))
                    })
                    .cloned()
                    .collect();
                let others: CandidateSet = candidates.difference(&winners).cloned().collect();
                let order: Vec<CandidateSet> = if winners.is_empty() {
                    vec![candidates.clone()]
                } else {
                    vec![winners, others]
                };
                let order = order.into_iter().filter(|c| !c.is_empty()).collect();
                RuleOutcome::new(
                    self.tie_break,
                    matrix.profile_converted().clone(),
                    candidates,
                    order,
                    None,
                    OutcomeDetail::Matrix(matrix),
                )
            }
            RuleKind::SimplifiedDodgson(r) => {
                let matrix = r.matrix.load(profile, candidates)?;
                let scores: BTreeMap<Candidate, f64> = matrix
                    .candidates()
                    .iter()
                    .map(|c| {
                        let sum: f64 = matrix
                            .as_dict()
                            .iter()
                            .filter(|((i, j), v)| i == c && j != c && **v < 0.0)
                            .map(|(_, v)| *v)
                            .sum();
                        (c.clone(), sum)
                    })
                    .collect();
                let order = order_by_numbers(&scores)?;
                RuleOutcome::new(
                    self.tie_break,
                    matrix.profile_converted().clone(),
                    matrix.candidates().clone(),
                    order,
                    Some(numbers(scores)),
                    OutcomeDetail::Matrix(matrix),
                )
            }
            RuleKind::SequentialTieBreak(rules) => self.sequential(rules, profile, candidates)?,
            RuleKind::IteratedElimination(r) => self.eliminations(r, profile, candidates)?,
        };
        info!(
            "load: {} candidates, order {:?}",
            outcome.n_candidates(),
            outcome.order()
        );
        Ok(outcome)
    }

    fn scored(&self, loaded: LoadedProfile, scores: BTreeMap<Candidate, f64>) -> VotingResult<RuleOutcome> {
        let order = order_by_numbers(&scores)?;
        Ok(RuleOutcome::new(
            self.tie_break,
            loaded.converted,
            loaded.candidates,
            order,
            Some(numbers(scores)),
            OutcomeDetail::Scores,
        ))
    }

    fn sequential(&self, rules: &[Rule], profile: &Profile, candidates: Option<&CandidateSet>) -> VotingResult<RuleOutcome> {
        let loaded = load_profile(profile, &Converter::default(), candidates)?;
        let mut outcomes: Vec<RuleOutcome> = Vec::with_capacity(rules.len());
        for rule in rules.iter() {
            outcomes.push(rule.load(profile, Some(&loaded.candidates))?);
        }
        // The rank of each candidate in each of the orders.
        let ranks: BTreeMap<Candidate, Vec<usize>> = loaded
            .candidates
            .iter()
            .map(|c| {
                let r = outcomes
                    .iter()
                    .map(|o| o.order().iter().position(|class| class.contains(c)).unwrap_or(usize::MAX))
                    .collect();
                (c.clone(), r)
            })
            .collect();
        let mut sorted: Vec<(&Candidate, &Vec<usize>)> = ranks.iter().collect();
        sorted.sort_by(|a, b| a.1.cmp(b.1));
        let mut order: Vec<CandidateSet> = Vec::new();
        let mut last: Option<&Vec<usize>> = None;
        for (c, r) in sorted {
            match (last, order.last_mut()) {
                (Some(l), Some(class)) if l == r => {
                    class.insert(c.clone());
                }
                _ => order.push(candidate_set(&[c])),
            }
            last = Some(r);
        }
        Ok(RuleOutcome::new(
            self.tie_break,
            loaded.converted,
            loaded.candidates,
            order,
            None,
            OutcomeDetail::Rules(outcomes),
        ))
    }

    fn eliminations(
        &self,
        r: &RuleIteratedElimination,
        profile: &Profile,
        candidates: Option<&CandidateSet>,
    ) -> VotingResult<RuleOutcome> {
        let loaded = load_profile(profile, &Converter::default(), candidates)?;
        let base_rule = if r.propagate_tie_break {
            r.base_rule.as_ref().clone().with_tie_break(self.tie_break)
        } else {
            r.base_rule.as_ref().clone()
        };
        let mut remaining = loaded.candidates.clone();
        let mut rounds: Vec<EliminationRound> = Vec::new();
        while !remaining.is_empty() {
            let outcome = base_rule.load(profile, Some(&remaining))?;
            let eliminated_order = r.elimination.eliminated_order(&outcome)?;
            let mut qualified = remaining.clone();
            for c in eliminated_order.iter().flatten() {
                qualified.remove(c);
            }
            debug!(
                "eliminations: round {}: eliminated {:?}",
                rounds.len() + 1,
                eliminated_order
            );
            // A round that eliminates nobody would never end.
            let eliminated_order = if qualified.len() == remaining.len() {
                qualified.clear();
                outcome.order().to_vec()
            } else {
                eliminated_order
            };
            rounds.push(EliminationRound {
                outcome,
                eliminated_order,
                qualified: qualified.clone(),
            });
            remaining = qualified;
        }
        let order: Vec<CandidateSet> = rounds
            .iter()
            .rev()
            .flat_map(|round| round.eliminated_order.iter().cloned())
            .collect();
        Ok(RuleOutcome::new(
            self.tie_break,
            loaded.converted,
            loaded.candidates,
            order,
            None,
            OutcomeDetail::Rounds(rounds),
        ))
    }
}

fn numbers(scores: BTreeMap<Candidate, f64>) -> BTreeMap<Candidate, Score> {
    scores.into_iter().map(|(c, x)| (c, Score::Number(x))).collect()
}

fn level_as_f64(c: &str, level: &Level) -> VotingResult<f64> {
    level.as_f64().ok_or_else(|| VotingError::ScaleMismatch {
        message: format!("score {} of {:?} is not a number", level, c),
    })
}

fn sum_scores(loaded: &LoadedProfile, scorer: &Scorer) -> VotingResult<BTreeMap<Candidate, f64>> {
    let mut res: BTreeMap<Candidate, f64> = loaded.candidates.iter().map(|c| (c.clone(), 0.0)).collect();
    for e in loaded.converted.iter() {
        for (c, level) in scorer.scores(&e.ballot, e.voter.as_deref(), &loaded.candidates)? {
            if let (Some(level), Some(total)) = (level, res.get_mut(&c)) {
                *total += e.weight * level_as_f64(&c, &level)?;
            }
        }
    }
    Ok(res)
}

fn average_scores(loaded: &LoadedProfile, scorer: &Scorer, default_average: f64) -> VotingResult<BTreeMap<Candidate, f64>> {
    let mut totals: BTreeMap<Candidate, (f64, f64)> =
        loaded.candidates.iter().map(|c| (c.clone(), (0.0, 0.0))).collect();
    for e in loaded.converted.iter() {
        for (c, level) in scorer.scores(&e.ballot, e.voter.as_deref(), &loaded.candidates)? {
            if let (Some(level), Some((total, weight))) = (level, totals.get_mut(&c)) {
                *total += e.weight * level_as_f64(&c, &level)?;
                *weight += e.weight;
            }
        }
    }
    Ok(totals
        .into_iter()
        .map(|(c, (total, weight))| {
            let avg = if weight > 0.0 { total / weight } else { default_average };
            (c, avg)
        })
        .collect())
}

/// Groups the candidates by decreasing score.
fn order_by<F>(scores: &BTreeMap<Candidate, Score>, mut cmp: F) -> VotingResult<Vec<CandidateSet>>
where
    F: FnMut(&Score, &Score) -> VotingResult<Ordering>,
{
    let mut sorted: Vec<(&Candidate, &Score)> = scores.iter().collect();
    try_sort_by(&mut sorted, |a, b| cmp(b.1, a.1))?;
    let mut order: Vec<CandidateSet> = Vec::new();
    let mut last: Option<&Score> = None;
    for (c, s) in sorted {
        let same = match last {
            Some(l) => cmp(l, s)? == Ordering::Equal,
            None => false,
        };
        match order.last_mut() {
            Some(class) if same => {
                class.insert(c.clone());
            }
            _ => order.push(candidate_set(&[c])),
        }
        last = Some(s);
    }
    Ok(order)
}

fn order_by_numbers(scores: &BTreeMap<Candidate, f64>) -> VotingResult<Vec<CandidateSet>> {
    order_by(&numbers(scores.clone()), |a, b| match (a, b) {
        (Score::Number(x), Score::Number(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        _ => UnsupportedSnafu {
            message: "only numeric scores can be compared as numbers",
        }
        .fail(),
    })
}

// ********* Majority Judgment ***********

impl RuleMajorityJudgment {
    fn outcome(&self, tie_break: Priority, loaded: LoadedProfile) -> VotingResult<RuleOutcome> {
        let scale = self.scorer.scale();
        let mut grades: BTreeMap<Candidate, Vec<(Level, f64)>> =
            loaded.candidates.iter().map(|c| (c.clone(), Vec::new())).collect();
        for e in loaded.converted.iter() {
            for (c, level) in self.scorer.scores(&e.ballot, e.voter.as_deref(), &loaded.candidates)? {
                if let (Some(level), Some(g)) = (level, grades.get_mut(&c)) {
                    g.push((level, e.weight));
                }
            }
        }
        let mut scores: BTreeMap<Candidate, Score> = BTreeMap::new();
        for (c, g) in grades.into_iter() {
            scores.insert(c, self.score(&scale, g)?);
        }
        let order = order_by(&scores, |a, b| compare_judgments(&scale, a, b))?;
        Ok(RuleOutcome::new(
            tie_break,
            loaded.converted,
            loaded.candidates,
            order,
            Some(scores),
            OutcomeDetail::Scores,
        ))
    }

    // The lower median when two levels share the middle weight.
    fn score(&self, scale: &Scale, grades: Vec<(Level, f64)>) -> VotingResult<Score> {
        if grades.is_empty() {
            return Ok(Score::Judgment(self.default_median.clone(), 0.0, 0.0));
        }
        let levels: Vec<Level> = grades.iter().map(|g| g.0.clone()).collect();
        let indexes = scale.argsort(&levels)?;
        let total_weight: f64 = grades.iter().map(|g| g.1).sum();
        let half = total_weight / 2.0;
        let mut cumulative = 0.0;
        let mut median = &grades[indexes[indexes.len() - 1]].0;
        for i in indexes.iter() {
            cumulative += grades[*i].1;
            if cumulative >= half {
                median = &grades[*i].0;
                break;
            }
        }
        let mut p = 0.0;
        let mut q = 0.0;
        for (level, weight) in grades.iter() {
            match scale.compare(level, median)? {
                Ordering::Greater => p += weight,
                Ordering::Less => q += weight,
                Ordering::Equal => {}
            }
        }
        let (p, q) = if total_weight > 0.0 {
            (p / total_weight, q / total_weight)
        } else {
            (0.0, 0.0)
        };
        Ok(if p > q {
            Score::Judgment(Some(median.clone()), p, -q)
        } else {
            Score::Judgment(Some(median.clone()), -q, p)
        })
    }
}

fn compare_judgments(scale: &Scale, a: &Score, b: &Score) -> VotingResult<Ordering> {
    match (a, b) {
        (Score::Judgment(ma, a1, a2), Score::Judgment(mb, b1, b2)) => {
            let by_median = match (ma, mb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => scale.compare(x, y)?,
            };
            Ok(by_median
                .then(a1.partial_cmp(b1).unwrap_or(Ordering::Equal))
                .then(a2.partial_cmp(b2).unwrap_or(Ordering::Equal)))
        }
        _ => UnsupportedSnafu {
            message: "only judgments can be compared as judgments",
        }
        .fail(),
    }
}

// ********* Elimination ***********

impl Elimination {
    /// The weak order of the candidates eliminated after this round, best first.
    pub fn eliminated_order(&self, outcome: &RuleOutcome) -> VotingResult<Vec<CandidateSet>> {
        let eliminated: CandidateSet = match self {
            Elimination::BelowAverage => {
                let scores = outcome.scores().context(UnsupportedSnafu {
                    message: "elimination below average needs a rule with scores",
                })?;
                let mut values: BTreeMap<&Candidate, f64> = BTreeMap::new();
                for (c, s) in scores.iter() {
                    let x = s.as_f64().context(UnsupportedSnafu {
                        message: format!("the score of {:?} is not a number", c),
                    })?;
                    values.insert(c, x);
                }
                if values.is_empty() {
                    return Ok(vec![]);
                }
                let average = values.values().sum::<f64>() / values.len() as f64;
                let below: CandidateSet = values
                    .iter()
                    .filter(|(_, x)| **x < average)
                    .map(|(c, _)| (*c).clone())
                    .collect();
                if below.is_empty() {
                    outcome.candidates().clone()
                } else {
                    below
                }
            }
            Elimination::Last(k) => {
                let strict = outcome.strict_order()?;
                let start = strict.len().saturating_sub(*k);
                strict[start..].iter().cloned().collect()
            }
        };
        Ok(outcome
            .order()
            .iter()
            .map(|class| class.intersection(&eliminated).cloned().collect::<CandidateSet>())
            .filter(|class| !class.is_empty())
            .collect())
    }
}

// ********* Outcome ***********

/// One round of an iterated elimination.
#[derive(Debug, Clone)]
pub struct EliminationRound {
    /// The base rule on the candidates of the round.
    pub outcome: RuleOutcome,
    pub eliminated_order: Vec<CandidateSet>,
    /// The candidates that go to the next round.
    pub qualified: CandidateSet,
}

/// What a rule computed on the way to its order.
#[derive(Debug, Clone)]
pub enum OutcomeDetail {
    Scores,
    Matrix(MatrixOutcome),
    Rules(Vec<RuleOutcome>),
    Rounds(Vec<EliminationRound>),
}

/// The result of a rule on one profile.
///
/// It is computed once by [`Rule::load`] and never changes; loading another profile
/// gives another outcome.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    tie_break: Priority,
    converted: Profile,
    candidates: CandidateSet,
    order: Vec<CandidateSet>,
    scores: Option<BTreeMap<Candidate, Score>>,
    detail: OutcomeDetail,
    strict_order: OnceCell<Vec<Candidate>>,
}

impl RuleOutcome {
    fn new(
        tie_break: Priority,
        converted: Profile,
        candidates: CandidateSet,
        order: Vec<CandidateSet>,
        scores: Option<BTreeMap<Candidate, Score>>,
        detail: OutcomeDetail,
    ) -> RuleOutcome {
        RuleOutcome {
            tie_break,
            converted,
            candidates,
            order,
            scores,
            detail,
            strict_order: OnceCell::new(),
        }
    }

    /// The weak order over the candidates, the winners first.
    pub fn order(&self) -> &[CandidateSet] {
        &self.order
    }

    pub fn cowinners(&self) -> CandidateSet {
        self.order.first().cloned().unwrap_or_default()
    }

    /// The winner, after the tie-break. `None` when there is no candidate.
    pub fn winner(&self) -> VotingResult<Option<Candidate>> {
        self.tie_break.choice(&self.cowinners(), false)
    }

    /// The candidates tied for the worst place.
    pub fn cotrailers(&self) -> CandidateSet {
        self.order.last().cloned().unwrap_or_default()
    }

    pub fn trailer(&self) -> VotingResult<Option<Candidate>> {
        self.tie_break.choice(&self.cotrailers(), true)
    }

    /// All the candidates from the winner to the trailer, ties broken.
    pub fn strict_order(&self) -> VotingResult<&[Candidate]> {
        let res = self.strict_order.get_or_try_init(|| {
            let mut res: Vec<Candidate> = Vec::with_capacity(self.candidates.len());
            for class in self.order.iter() {
                res.extend(self.tie_break.sort(class, false)?);
            }
            Ok::<Vec<Candidate>, VotingError>(res)
        })?;
        Ok(res.as_slice())
    }

    pub fn scores(&self) -> Option<&BTreeMap<Candidate, Score>> {
        self.scores.as_ref()
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    pub fn n_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// The ballots as the rule read them.
    pub fn profile_converted(&self) -> &Profile {
        &self.converted
    }

    pub fn detail(&self) -> &OutcomeDetail {
        &self.detail
    }

    pub fn matrix(&self) -> Option<&MatrixOutcome> {
        match &self.detail {
            OutcomeDetail::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// The outcomes of the rules of a sequential tie-break.
    pub fn sub_outcomes(&self) -> &[RuleOutcome] {
        match &self.detail {
            OutcomeDetail::Rules(r) => r,
            _ => &[],
        }
    }

    pub fn rounds(&self) -> &[EliminationRound] {
        match &self.detail {
            OutcomeDetail::Rounds(r) => r,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::Ballot;

    fn raw(ballots: &[&str]) -> Vec<RawBallot> {
        ballots.iter().map(|b| RawBallot::from(*b)).collect()
    }

    fn levels(pairs: &[(&str, f64)]) -> RawBallot {
        RawBallot::Levels(pairs.iter().map(|(c, v)| (c.to_string(), Level::Float(*v))).collect())
    }

    fn number_scores(outcome: &RuleOutcome) -> BTreeMap<String, f64> {
        outcome
            .scores()
            .unwrap()
            .iter()
            .map(|(c, s)| (c.clone(), s.as_f64().unwrap()))
            .collect()
    }

    fn expected(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(c, v)| (c.to_string(), *v)).collect()
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn plurality_and_tie_break() {
        let ballots = raw(&["a", "b", "c > a"]);
        let outcome = Rule::plurality().load_ballots(ballots.clone(), None, None, None).unwrap();
        assert_eq!(outcome.order(), &[candidate_set(&["a", "b", "c"])]);
        assert!(matches!(outcome.winner(), Err(VotingError::AmbiguousTie { .. })));
        assert!(outcome.strict_order().is_err());
        let ascending = Rule::plurality().with_tie_break(Priority::Ascending);
        let outcome = ascending.load_ballots(ballots, None, None, None).unwrap();
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
        assert_eq!(outcome.trailer().unwrap(), Some("c".to_string()));
        assert_eq!(outcome.strict_order().unwrap(), &["a", "b", "c"]);
    }

    #[test]
    fn plurality_refuses_a_tied_favourite() {
        let res = Rule::plurality().load_ballots(raw(&["a ~ b > c", "c"]), None, None, None);
        assert!(matches!(res, Err(VotingError::AmbiguousTie { .. })));
        let res = Rule::veto().load_ballots(raw(&["a > b ~ c", "c > a > b"]), None, None, None);
        assert!(matches!(res, Err(VotingError::AmbiguousTie { .. })));
        let lenient = Rule::new(RuleKind::ScoreSum(RuleScoreSum {
            converter: Converter::ToPlurality(ConverterToPlurality {
                order_priority: Priority::Ascending,
                ..ConverterToPlurality::DEFAULT
            }),
            scorer: Scorer::Plurality(ScorerPlurality::default()),
        }));
        let outcome = lenient.load_ballots(raw(&["a ~ b > c", "c"]), None, None, None).unwrap();
        assert_eq!(number_scores(&outcome), expected(&[("a", 1.0), ("b", 0.0), ("c", 1.0)]));
    }

    #[test]
    fn weighted_plurality_scores() {
        let outcome = Rule::plurality()
            .load_ballots(raw(&["a", "b", "b > a"]), Some(vec![3.0, 1.0, 1.0]), None, None)
            .unwrap();
        assert_eq!(number_scores(&outcome), expected(&[("a", 3.0), ("b", 2.0)]));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
        assert_eq!(outcome.n_candidates(), 2);
    }

    #[test]
    fn borda_over_declared_candidates() {
        let cands = candidate_set(&["a", "b", "c", "d"]);
        let outcome = Rule::borda()
            .load_ballots(raw(&["a > b > c > d", "b > a > c"]), None, None, Some(&cands))
            .unwrap();
        // d is absent from the second ballot: all the others beat it and it gets 0.
        assert_eq!(
            number_scores(&outcome),
            expected(&[("a", 5.0), ("b", 5.0), ("c", 2.0), ("d", 0.0)])
        );
        assert_eq!(outcome.cowinners(), candidate_set(&["a", "b"]));
        assert_eq!(outcome.cotrailers(), candidate_set(&["d"]));
    }

    #[test]
    fn range_voting_skips_uncounted() {
        let ballots = vec![levels(&[("a", 1.0), ("b", 0.5)]), levels(&[("a", 0.0)])];
        let outcome = Rule::range_voting(None).load_ballots(ballots, None, None, None).unwrap();
        assert_eq!(number_scores(&outcome), expected(&[("a", 0.5), ("b", 0.5)]));
        let ballots = vec![
            RawBallot::Ballot(Ballot::Levels(
                crate::ballot::BallotLevels::new(
                    [("a".to_string(), Level::Int(8)), ("b".to_string(), Level::Int(4))].into_iter().collect(),
                    None,
                    Some(Scale::range(0, 10)),
                )
                .unwrap(),
            )),
            RawBallot::Ballot(Ballot::Levels(
                crate::ballot::BallotLevels::new(
                    [("a".to_string(), Level::Int(2))].into_iter().collect(),
                    None,
                    Some(Scale::range(0, 10)),
                )
                .unwrap(),
            )),
        ];
        let outcome = Rule::range_voting(Some(Scale::range(0, 10)))
            .load_ballots(ballots, None, None, None)
            .unwrap();
        assert_eq!(number_scores(&outcome), expected(&[("a", 5.0), ("b", 4.0)]));
    }

    #[test]
    fn majority_judgment_numeric() {
        let ballots = vec![
            levels(&[("a", 1.0), ("b", 1.0)]),
            levels(&[("a", 0.5), ("b", 0.6)]),
            levels(&[("a", 0.5), ("b", 0.4)]),
            levels(&[("a", 0.3), ("b", 0.2)]),
        ];
        let outcome = Rule::majority_judgment(None).load_ballots(ballots, None, None, None).unwrap();
        let scores = outcome.scores().unwrap();
        assert_eq!(scores["a"], Score::Judgment(Some(Level::Float(0.5)), -0.25, 0.25));
        assert_eq!(scores["b"], Score::Judgment(Some(Level::Float(0.4)), 0.5, -0.25));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
    }

    #[test]
    fn majority_judgment_verbal() {
        let scale = Scale::from_list(vec!["To Reject", "Poor", "Acceptable", "Good", "Very Good", "Excellent"]);
        let verbal = |a: &str, b: &str| -> RawBallot {
            RawBallot::Levels(
                [("a".to_string(), Level::from(a)), ("b".to_string(), Level::from(b))]
                    .into_iter()
                    .collect(),
            )
        };
        let ballots = vec![
            verbal("Excellent", "Excellent"),
            verbal("Good", "Very Good"),
            verbal("Good", "Acceptable"),
            verbal("Poor", "To Reject"),
        ];
        let outcome = Rule::majority_judgment(Some(scale)).load_ballots(ballots, None, None, None).unwrap();
        let scores = outcome.scores().unwrap();
        assert_eq!(scores["a"], Score::Judgment(Some("Good".into()), -0.25, 0.25));
        assert_eq!(scores["b"], Score::Judgment(Some("Acceptable".into()), 0.5, -0.25));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
    }

    #[test]
    fn majority_judgment_on_borda_scores() {
        let rule = Rule::new(RuleKind::MajorityJudgment(RuleMajorityJudgment {
            converter: Converter::ToOrder(ConverterToOrder::default()),
            scorer: Scorer::Borda(ScorerBorda::default()),
            default_median: None,
        }));
        let cands = candidate_set(&["a", "b", "c", "d", "e"]);
        let outcome = rule
            .load_ballots(raw(&["a > b ~ c", "c > a > b > d"]), None, None, Some(&cands))
            .unwrap();
        let scores = outcome.scores().unwrap();
        assert_eq!(scores["a"], Score::Judgment(Some(Level::Float(3.0)), 0.5, 0.0));
        assert_eq!(scores["c"], Score::Judgment(Some(Level::Float(2.5)), 0.5, 0.0));
        assert_eq!(scores["e"], Score::Judgment(Some(Level::Float(0.0)), 0.5, 0.0));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
    }

    #[test]
    fn majority_judgment_default_median() {
        let cands = candidate_set(&["a", "b"]);
        let outcome = Rule::majority_judgment(None)
            .load_ballots(vec![levels(&[("a", 0.2)])], None, None, Some(&cands))
            .unwrap();
        assert_eq!(outcome.scores().unwrap()["b"], Score::Judgment(None, 0.0, 0.0));
        assert_eq!(outcome.order(), &[candidate_set(&["a"]), candidate_set(&["b"])]);
    }

    #[test]
    fn condorcet_and_black() {
        let ballots = raw(&["a > b > c", "b > c > a"]);
        let weights = Some(vec![6.0, 4.0]);
        let condorcet = Rule::condorcet().load_ballots(ballots.clone(), weights.clone(), None, None).unwrap();
        assert_eq!(condorcet.order(), &[candidate_set(&["a"]), candidate_set(&["b", "c"])]);
        assert_eq!(condorcet.matrix().unwrap().weighted_majority().unwrap().get("a", "b"), Some(0.6));
        let black = Rule::black().load_ballots(ballots, weights, None, None).unwrap();
        assert_eq!(
            black.order(),
            &[candidate_set(&["a"]), candidate_set(&["b"]), candidate_set(&["c"])]
        );
        assert_eq!(black.sub_outcomes().len(), 2);
        // No Condorcet winner: the Borda order decides.
        let cycle = raw(&["a > b > c", "b > c > a", "c > a > b"]);
        let weights = Some(vec![2.0, 1.0, 1.0]);
        let condorcet = Rule::condorcet().load_ballots(cycle.clone(), weights.clone(), None, None).unwrap();
        assert_eq!(condorcet.order(), &[candidate_set(&["a", "b", "c"])]);
        let black = Rule::black().load_ballots(cycle, weights, None, None).unwrap();
        assert_eq!(
            black.order(),
            &[candidate_set(&["a"]), candidate_set(&["b"]), candidate_set(&["c"])]
        );
    }

    #[test]
    fn simplified_dodgson() {
        let outcome = Rule::simplified_dodgson()
            .load_ballots(raw(&["a > b > c", "b > a > c", "c > a > b"]), Some(vec![3.0, 3.0, 2.0]), None, None)
            .unwrap();
        assert_eq!(number_scores(&outcome), expected(&[("a", 0.0), ("b", -0.25), ("c", -1.0)]));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
        assert_eq!(outcome.matrix().unwrap().get("b", "a"), Some(-0.25));
    }

    #[test]
    fn kim_roush_rounds() {
        init();
        let outcome = Rule::kim_roush()
            .load_ballots(raw(&["a > b > c > d", "a > b > d > c"]), None, None, None)
            .unwrap();
        let rounds = outcome.rounds();
        assert_eq!(rounds.len(), 3);
        assert_eq!(
            number_scores(&rounds[0].outcome),
            expected(&[("a", 0.0), ("b", 0.0), ("c", -1.0), ("d", -1.0)])
        );
        assert_eq!(number_scores(&rounds[1].outcome), expected(&[("a", 0.0), ("b", -2.0)]));
        assert_eq!(number_scores(&rounds[2].outcome), expected(&[("a", -2.0)]));
        assert_eq!(rounds[0].qualified, candidate_set(&["a", "b"]));
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
        assert_eq!(
            outcome.order(),
            &[candidate_set(&["a"]), candidate_set(&["b"]), candidate_set(&["c", "d"])]
        );
    }

    #[test]
    fn instant_runoff() {
        init();
        let ballots = raw(&["a > b > c", "b > a > c", "c > b > a"]);
        let outcome = Rule::irv()
            .load_ballots(ballots, Some(vec![4.0, 2.0, 3.0]), None, None)
            .unwrap();
        // b is eliminated first, its ballots go to a.
        assert_eq!(outcome.rounds()[0].eliminated_order, vec![candidate_set(&["b"])]);
        assert_eq!(outcome.winner().unwrap(), Some("a".to_string()));
        assert_eq!(outcome.strict_order().unwrap(), &["a", "c", "b"]);
    }

    #[test]
    fn nanson() {
        init();
        let outcome = Rule::nanson()
            .load_ballots(raw(&["a > b > c", "b > c > a", "c > a > b"]), Some(vec![2.0, 1.0, 1.0]), None, None)
            .unwrap();
        // Borda scores 5, 4, 3: c is below average, then a beats b.
        assert_eq!(outcome.rounds()[0].eliminated_order, vec![candidate_set(&["c"])]);
        assert_eq!(
            outcome.order(),
            &[candidate_set(&["a"]), candidate_set(&["b"]), candidate_set(&["c"])]
        );
    }

    #[test]
    fn reloading_gives_a_fresh_outcome() {
        let rule = Rule::plurality();
        let first = rule.load_ballots(raw(&["a", "a", "b"]), None, None, None).unwrap();
        let second = rule.load_ballots(raw(&["b", "b", "a"]), None, None, None).unwrap();
        assert_eq!(first.winner().unwrap(), Some("a".to_string()));
        assert_eq!(second.winner().unwrap(), Some("b".to_string()));
        assert_eq!(first.strict_order().unwrap(), &["a", "b"]);
    }

    #[test]
    fn empty_election() {
        let outcome = Rule::borda().load_ballots(vec![], None, None, None).unwrap();
        assert!(outcome.order().is_empty());
        assert_eq!(outcome.winner().unwrap(), None);
    }
}
