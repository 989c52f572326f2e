use log::{debug, info, warn};

use social_choice::builder::ProfileBuilder;
use social_choice::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tab::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;

#[derive(Debug, Snafu)]
pub enum TabError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary { source: std::io::Error, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing a line of CSV"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Could not read the number {value}"))]
    ParsingNumber { value: String },
    #[snafu(display("Invalid ballot {id}: {source}"))]
    InvalidBallot { source: VotingError, id: String },
    #[snafu(display("Voting error: {source}"))]
    Voting { source: VotingError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TabResult<T> = Result<T, TabError>;

/// What the readers need to know to build the ballots of the election.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct BallotContext {
    /// The candidates of the election, when they are declared.
    pub candidates: Option<CandidateSet>,
    /// The scale of the evaluations, when the rule has one.
    pub scale: Option<Scale>,
}

/// A ballot, as parsed by the readers.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<f64>,
    pub choices: RawBallot,
}

fn validate_rule(rule_config: &RuleConfig) -> TabResult<Rule> {
    let name = rule_config.name.as_deref().unwrap_or("plurality");
    let mut rule = match name {
        "plurality" => Rule::plurality(),
        "veto" => Rule::veto(),
        "borda" => Rule::borda(),
        "bucklin" => Rule::bucklin(rule_config.k.unwrap_or(1)),
        "rangeVoting" => Rule::range_voting(rule_config.scale.clone()),
        "majorityJudgment" => Rule::majority_judgment(rule_config.scale.clone()),
        "condorcet" => Rule::condorcet(),
        "simplifiedDodgson" => Rule::simplified_dodgson(),
        "black" => Rule::black(),
        "kimRoush" => Rule::kim_roush(),
        "irv" => Rule::irv(),
        "nanson" => Rule::nanson(),
        x => {
            whatever!("Cannot use rule {:?} (currently not implemented)", x)
        }
    };
    if rule_config.scale.is_some() && !matches!(name, "rangeVoting" | "majorityJudgment") {
        warn!("validate_rule: rule {} does not use a scale, ignoring it", name);
    }
    if rule_config.k.is_some() && name != "bucklin" {
        warn!("validate_rule: rule {} does not use k, ignoring it", name);
    }
    if let Some(give_points) = rule_config.borda_unordered_give_points {
        let converter = match &mut rule.kind {
            RuleKind::ScoreAverage(r) => Some(&mut r.converter),
            RuleKind::MajorityJudgment(r) => Some(&mut r.converter),
            _ => None,
        };
        match converter {
            Some(Converter::ToLevels(c)) => c.borda_unordered_give_points = give_points,
            _ => warn!(
                "validate_rule: rule {} does not convert rankings to levels, ignoring bordaUnorderedGivePoints",
                name
            ),
        }
    }
    let tie_break = validate_tiebreak(rule_config)?;
    Ok(rule.with_tie_break(tie_break))
}

fn validate_tiebreak(rule_config: &RuleConfig) -> TabResult<Priority> {
    let res = match rule_config.tiebreak_mode.as_deref() {
        None | Some("unambiguous") => Priority::Unambiguous,
        Some("ascending") | Some("useCandidateOrder") => Priority::Ascending,
        Some("descending") => Priority::Descending,
        Some("random") => {
            let seed = match read_js_int(&rule_config.random_seed).map(u32::try_from) {
                Ok(Ok(x)) => x,
                x => {
                    whatever!("Cannot use tiebreak mode random with seed {:?}", x)
                }
            };
            Priority::Random(seed)
        }
        Some(x) => {
            whatever!("Cannot use tiebreak mode {:?} (currently not implemented)", x)
        }
    };
    Ok(res)
}

fn validate_ballot(config: &BallotConfig, ctx: &BallotContext) -> TabResult<RawBallot> {
    let id = config.voter.clone().unwrap_or_default();
    let candidates: Option<CandidateSet> = config.candidates.as_ref().map(|c| candidate_set(c));
    let res = match (config.kind.as_deref(), &config.ballot) {
        (Some("plurality"), BallotInput::Text(s)) => RawBallot::Ballot(Ballot::plurality(named(s), candidates)),
        (Some("veto"), BallotInput::Text(s)) => RawBallot::Ballot(Ballot::veto(named(s), candidates)),
        (Some("oneName"), BallotInput::Text(s)) => RawBallot::Ballot(Ballot::one_name(named(s), candidates)),
        (None, BallotInput::Text(s)) if candidates.is_some() => RawBallot::Ballot(order_or_one_name(
            BallotOrder::parse(s, candidates).context(InvalidBallotSnafu { id })?,
        )),
        (None, BallotInput::Text(s)) => RawBallot::Text(s.clone()),
        (Some("order"), BallotInput::Text(s)) => RawBallot::Ballot(Ballot::Order(
            BallotOrder::parse(s, candidates).context(InvalidBallotSnafu { id })?,
        )),
        (None | Some("order"), BallotInput::Order(classes)) => {
            let classes: Vec<CandidateSet> = classes.iter().map(|c| candidate_set(c)).collect();
            RawBallot::Ballot(Ballot::Order(
                BallotOrder::new(classes, candidates).context(InvalidBallotSnafu { id })?,
            ))
        }
        (None | Some("levels"), BallotInput::Levels(levels)) => RawBallot::Ballot(Ballot::Levels(
            BallotLevels::new(levels.clone(), candidates, ctx.scale.clone()).context(InvalidBallotSnafu { id })?,
        )),
        (kind, b) => {
            whatever!("Cannot read ballot {:?} of kind {:?}", b, kind)
        }
    };
    Ok(res)
}

// An empty name is an abstention.
fn named(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

fn read_ballot_data(root_path: &Path, cfs: &FileSource, ctx: &BallotContext) -> TabResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(&p2, cfs, ctx),
        "csv_levels" => io_csv::read_csv_levels(&p2, cfs, ctx),
        "json" => {
            let contents = fs::read_to_string(&p2).context(OpeningJsonSnafu { path: p2.clone() })?;
            let ballots: Vec<BallotConfig> = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
            ballots.iter().map(|b| parsed_ballot(b, ctx)).collect()
        }
        x => {
            whatever!("Provider not implemented {:?}", x)
        }
    }
}

fn parsed_ballot(config: &BallotConfig, ctx: &BallotContext) -> TabResult<ParsedBallot> {
    Ok(ParsedBallot {
        id: config.voter.clone(),
        count: config.weight,
        choices: validate_ballot(config, ctx)?,
    })
}

fn validate_ballots(parsed_ballots: &[ParsedBallot]) -> TabResult<Profile> {
    let mut builder = ProfileBuilder::new();
    for pb in parsed_ballots.iter() {
        // Default of 1 if not specified
        let count = pb.count.unwrap_or(1.0);
        if count == 0.0 {
            debug!("validate_ballots: skipping ballot {:?} with no weight", pb.id);
            continue;
        }
        builder
            .add_ballot(pb.choices.clone(), count, pb.id.as_deref())
            .context(InvalidBallotSnafu {
                id: pb.id.clone().unwrap_or_default(),
            })?;
    }
    builder.build().context(VotingSnafu {})
}

fn tie_broken<T: Serialize>(what: &str, res: VotingResult<T>) -> JSValue {
    match res {
        Ok(x) => json!(x),
        Err(e) => {
            warn!("{} not available: {}", what, e);
            JSValue::Null
        }
    }
}

fn outcome_to_json(outcome: &RuleOutcome) -> JSValue {
    json!({
        "candidates": outcome.candidates(),
        "order": outcome.order(),
        "scores": outcome.scores(),
    })
}

fn rounds_to_json(outcome: &RuleOutcome) -> Vec<JSValue> {
    outcome
        .rounds()
        .iter()
        .enumerate()
        .map(|(idx, round)| {
            let mut js = outcome_to_json(&round.outcome);
            js["round"] = json!(idx + 1);
            js["eliminated"] = json!(round.eliminated_order);
            js
        })
        .collect()
}

fn build_summary_js(config: &ElectionConfig, outcome: &RuleOutcome) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        rule: config.rule.name.clone().unwrap_or_else(|| "plurality".to_string()),
        tiebreak_mode: config
            .rule
            .tiebreak_mode
            .clone()
            .unwrap_or_else(|| "unambiguous".to_string()),
    };
    json!({
        "config": c,
        "candidates": outcome.candidates(),
        "order": outcome.order(),
        "strictOrder": tie_broken("strict order", outcome.strict_order()),
        "winner": tie_broken("winner", outcome.winner()),
        "cowinners": outcome.cowinners(),
        "trailer": tie_broken("trailer", outcome.trailer()),
        "scores": outcome.scores(),
        "matrix": outcome.matrix().map(|m| m.as_table()),
        "rounds": rounds_to_json(outcome),
    })
}

/// Runs the election described by the configuration. Relative file paths are read from
/// `root_path`.
pub fn tabulate(config: &ElectionConfig, root_path: &Path) -> TabResult<JSValue> {
    let rule = validate_rule(&config.rule)?;
    let candidates: Option<CandidateSet> = if config.candidates.is_empty() {
        None
    } else {
        Some(candidate_set(&config.candidates))
    };
    let ctx = BallotContext {
        candidates: candidates.clone(),
        scale: config.rule.scale.clone(),
    };

    let mut data: Vec<ParsedBallot> = Vec::new();
    for b in config.ballots.iter() {
        data.push(parsed_ballot(b, &ctx)?);
    }
    if let Some(cfs) = config.source.as_ref() {
        let mut file_data = read_ballot_data(root_path, cfs, &ctx)?;
        data.append(&mut file_data);
    }
    if data.is_empty() {
        warn!("tabulate: no ballot found");
    }
    debug!("data: {:?}", data);

    let profile = validate_ballots(&data)?;
    let outcome = rule.load(&profile, candidates.as_ref()).context(VotingSnafu {})?;
    info!("outcome: order {:?}", outcome.order());

    Ok(build_summary_js(config, &outcome))
}

pub fn run_election(args: &Args) -> TabResult<()> {
    let (mut config, root_path) = match args.config.as_ref() {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (ElectionConfig::default(), PathBuf::new()),
    };
    info!("config: {:?}", config);

    if let Some(rule) = args.rule.as_ref() {
        config.rule.name = Some(rule.clone());
    }
    if let Some(mode) = args.tiebreak.as_ref() {
        config.rule.tiebreak_mode = Some(mode.clone());
    }
    if let Some(seed) = args.random_seed {
        config.rule.random_seed = Some(json!(seed));
    }
    // Files given on the command line are relative to the working directory.
    let root_path = match (args.input.as_ref(), args.input_type.as_ref()) {
        (Some(input), input_type) => {
            config.source = Some(FileSource::new(input_type.map_or("csv", |s| s.as_str()), input));
            PathBuf::new()
        }
        (None, Some(input_type)) => {
            match config.source.as_mut() {
                Some(cfs) => cfs.provider = input_type.clone(),
                None => warn!("run_election: no input file, ignoring the input type {:?}", input_type),
            }
            root_path
        }
        (None, None) => root_path,
    };

    let result_js = tabulate(&config, &root_path)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            info!("Writing the summary to {:?}", path);
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.as_ref() {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats.as_ref(), "\n");
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a file in a directory private to this process.
    pub(crate) fn write_temp(name: &str, contents: &str) -> String {
        let dir = std::env::temp_dir().join(format!("choicetab-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn run(js: JSValue) -> JSValue {
        let config: ElectionConfig = serde_json::from_value(js).unwrap();
        tabulate(&config, Path::new("")).unwrap()
    }

    #[test]
    fn rules_and_tiebreaks() {
        let rule = |js: JSValue| validate_rule(&serde_json::from_value(js).unwrap());
        assert_eq!(rule(json!({})).unwrap(), Rule::plurality());
        assert_eq!(
            rule(json!({"name": "bucklin", "k": 2, "tiebreakMode": "ascending"})).unwrap(),
            Rule::bucklin(2).with_tie_break(Priority::Ascending)
        );
        assert_eq!(
            rule(json!({"name": "kimRoush", "tiebreakMode": "random", "randomSeed": "42"})).unwrap(),
            Rule::kim_roush().with_tie_break(Priority::Random(42))
        );
        assert!(rule(json!({"name": "kimRoush", "tiebreakMode": "random"})).is_err());
        assert!(rule(json!({"name": "approval"})).is_err());
        assert!(rule(json!({"tiebreakMode": "coinToss"})).is_err());
        let mj = rule(json!({"name": "majorityJudgment", "bordaUnorderedGivePoints": false})).unwrap();
        match mj.kind {
            RuleKind::MajorityJudgment(r) => assert_eq!(
                r.converter,
                Converter::ToLevels(ConverterToLevels {
                    scale: None,
                    borda_unordered_give_points: false
                })
            ),
            k => panic!("unexpected rule {:?}", k),
        }
    }

    #[test]
    fn ballots_of_every_kind() {
        let ctx = BallotContext::default();
        let ballot = |js: JSValue| validate_ballot(&serde_json::from_value(js).unwrap(), &ctx);
        assert_eq!(
            ballot(json!({"ballot": "a > b"})).unwrap(),
            RawBallot::Text("a > b".to_string())
        );
        assert_eq!(
            ballot(json!({"ballot": "a", "kind": "veto", "candidates": ["a", "b"]})).unwrap(),
            RawBallot::Ballot(Ballot::veto(Some("a"), Some(candidate_set(&["a", "b"]))))
        );
        assert_eq!(
            ballot(json!({"ballot": "", "kind": "plurality"})).unwrap(),
            RawBallot::Ballot(Ballot::plurality(None, None))
        );
        match ballot(json!({"ballot": "a > b", "candidates": ["a", "b", "c"]})).unwrap() {
            RawBallot::Ballot(Ballot::Order(b)) => assert_eq!(b.candidates_not_in_b(), candidate_set(&["c"])),
            b => panic!("unexpected ballot {:?}", b),
        }
        // A single name among declared candidates is not a ranking.
        assert_eq!(
            ballot(json!({"ballot": "a", "candidates": ["a", "b"]})).unwrap(),
            RawBallot::Ballot(Ballot::one_name(Some("a"), Some(candidate_set(&["a", "b"]))))
        );
        match ballot(json!({"ballot": "a", "kind": "order", "candidates": ["a", "b"]})).unwrap() {
            RawBallot::Ballot(Ballot::Order(b)) => assert_eq!(b.candidates_not_in_b(), candidate_set(&["b"])),
            b => panic!("unexpected ballot {:?}", b),
        }
        assert!(matches!(
            ballot(json!({"ballot": [["a"], ["a"]]})),
            Err(TabError::InvalidBallot { .. })
        ));
        assert!(ballot(json!({"ballot": {"a": 1}, "kind": "veto"})).is_err());
    }

    #[test]
    fn tabulate_inline_ballots() {
        let js = run(json!({
            "rule": {"name": "borda", "tiebreakMode": "ascending"},
            "ballots": [
                {"ballot": "a > c > b", "voter": "v1"},
                {"ballot": "c > a > b", "voter": "v2"},
                {"ballot": "b > a > c", "weight": 0.0}
            ]
        }));
        assert_eq!(js["candidates"], json!(["a", "b", "c"]));
        assert_eq!(js["order"], json!([["a", "c"], ["b"]]));
        assert_eq!(js["winner"], json!("a"));
        assert_eq!(js["strictOrder"], json!(["a", "c", "b"]));
        assert_eq!(js["trailer"], json!("b"));
        assert_eq!(js["scores"]["a"], json!(3.0));
        assert_eq!(js["config"]["rule"], json!("borda"));
        assert_eq!(js["matrix"], JSValue::Null);
    }

    #[test]
    fn tabulate_ambiguous_tie() {
        let js = run(json!({
            "ballots": [{"ballot": "a"}, {"ballot": "b"}]
        }));
        assert_eq!(js["cowinners"], json!(["a", "b"]));
        assert_eq!(js["winner"], JSValue::Null);
        assert_eq!(js["strictOrder"], JSValue::Null);
    }

    #[test]
    fn tabulate_condorcet_matrix() {
        let js = run(json!({
            "rule": {"name": "condorcet"},
            "ballots": [
                {"ballot": "a > b > c", "weight": 6.0},
                {"ballot": "b > c > a", "weight": 4.0}
            ]
        }));
        assert_eq!(js["winner"], json!("a"));
        assert_eq!(js["matrix"]["candidates"], json!(["a", "b", "c"]));
        assert_eq!(js["matrix"]["rows"][0], json!([0.5, 1.0, 1.0]));
    }

    #[test]
    fn tabulate_elimination_rounds() {
        let js = run(json!({
            "rule": {"name": "kimRoush"},
            "ballots": [{"ballot": "a > b > c > d"}, {"ballot": "a > b > d > c"}]
        }));
        assert_eq!(js["winner"], json!("a"));
        let rounds = js["rounds"].as_array().unwrap();
        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0]["round"], json!(1));
        assert_eq!(rounds[0]["eliminated"], json!([["c", "d"]]));
        assert_eq!(rounds[1]["scores"]["b"], json!(-2.0));
    }

    #[test]
    fn tabulate_csv_levels_source() {
        let path = write_temp("tabulate_csv_levels_source.csv", "a,b\nExcellent,Excellent\nGood,Very Good\nGood,Acceptable\nPoor,To Reject\n");
        let js = run(json!({
            "rule": {
                "name": "majorityJudgment",
                "scale": {"type": "fromList", "levels": ["To Reject", "Poor", "Acceptable", "Good", "Very Good", "Excellent"]}
            },
            "source": {"provider": "csv_levels", "filePath": path}
        }));
        assert_eq!(js["winner"], json!("a"));
        assert_eq!(js["scores"]["a"], json!(["Good", -0.25, 0.25]));
        assert_eq!(js["scores"]["b"], json!(["Acceptable", 0.5, -0.25]));
    }

    #[test]
    fn tabulate_json_source_with_declared_candidates() {
        let path = write_temp(
            "tabulate_json_source.json",
            r#"[{"ballot": "a > b"}, {"ballot": "b", "kind": "oneName"}, {"ballot": "a"}]"#,
        );
        let js = run(json!({
            "candidates": ["a", "b", "c"],
            "source": {"provider": "json", "filePath": path}
        }));
        assert_eq!(js["candidates"], json!(["a", "b", "c"]));
        assert_eq!(js["order"], json!([["a"], ["b"], ["c"]]));
        assert_eq!(js["scores"]["c"], json!(0.0));
    }

    #[test]
    fn missing_source_file() {
        let config: ElectionConfig = serde_json::from_value(json!({
            "source": {"provider": "csv", "filePath": "/nonexistent/choicetab/votes.csv"}
        }))
        .unwrap();
        assert!(matches!(tabulate(&config, Path::new("")), Err(TabError::CsvOpen { .. })));
    }
}
