use std::collections::BTreeMap;

use social_choice::{Level, Scale};

use crate::tab::*;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub contest_name: Option<String>,
    pub contest_date: Option<String>,
    pub contest_jurisdiction: Option<String>,
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct OutputConfig {
    pub contest: Option<String>,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub rule: String,
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: String,
}

/// Where to read more ballots from.
///
/// Indices are 1-based, as in spreadsheets. Columns may also be given as letters (`"A"`,
/// `"AB"`).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    /// Separates the tied candidates of a cell in a ranked CSV file. Default `~`.
    #[serde(rename = "tieDelimiter")]
    pub tie_delimiter: Option<String>,
}

impl FileSource {
    pub fn new(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            count_column_index: None,
            tie_delimiter: None,
        }
    }

    /// 0-based, default: the first column.
    pub fn first_vote_column_index(&self) -> TabResult<usize> {
        match self._first_vote_column_index {
            Some(_) => Ok(read_js_int(&self._first_vote_column_index)? - 1),
            None => Ok(0),
        }
    }

    /// 1-based, default: the first row.
    pub fn first_vote_row_index(&self) -> TabResult<usize> {
        match self._first_vote_row_index {
            Some(_) => read_js_int(&self._first_vote_row_index),
            None => Ok(1),
        }
    }

    pub fn id_column_index_int(&self) -> TabResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn count_column_index_int(&self) -> TabResult<Option<usize>> {
        if self.count_column_index.is_some() {
            read_js_int(&self.count_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn tie_delimiter(&self) -> &str {
        self.tie_delimiter.as_deref().unwrap_or("~")
    }
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub name: Option<String>,
    pub tiebreak_mode: Option<String>,
    pub random_seed: Option<JSValue>,
    /// The scale of the evaluations, for range voting and majority judgment.
    pub scale: Option<Scale>,
    /// The number of candidates that get a point in Bucklin.
    pub k: Option<usize>,
    pub borda_unordered_give_points: Option<bool>,
}

/// What a voter wrote: a text like `"a > b ~ c"`, the classes of a ranking, or grades.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BallotInput {
    Text(String),
    Order(Vec<Vec<String>>),
    Levels(BTreeMap<String, Level>),
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotConfig {
    pub ballot: BallotInput,
    /// `order`, `levels`, `oneName`, `plurality` or `veto`. Guessed when missing.
    pub kind: Option<String>,
    pub weight: Option<f64>,
    pub voter: Option<String>,
    /// The candidates available to this voter.
    pub candidates: Option<Vec<String>>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionConfig {
    #[serde(default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub rule: RuleConfig,
    /// The candidates of the election. When empty, all the candidates of the ballots.
    #[serde(default)]
    pub candidates: Vec<String>,
    #[serde(default)]
    pub ballots: Vec<BallotConfig>,
    pub source: Option<FileSource>,
}

pub fn read_config(path: &str) -> TabResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> TabResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub(crate) fn read_js_int(x: &Option<JSValue>) -> TabResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Spreadsheet-style columns
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_uppercase().bytes().try_fold(0usize, |acc, b| {
                acc.checked_mul(26)?.checked_add((b - b'A') as usize + 1)
            })
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(x) if x >= 1 => Ok(x),
        _ => ParsingNumberSnafu {
            value: format!("{:?}", x),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_indices() {
        assert_eq!(read_js_int(&Some(json!(3))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("12"))).unwrap(), 12);
        assert_eq!(read_js_int(&Some(json!("A"))).unwrap(), 1);
        assert_eq!(read_js_int(&Some(json!("c"))).unwrap(), 3);
        assert_eq!(read_js_int(&Some(json!("AB"))).unwrap(), 28);
        assert!(read_js_int(&Some(json!(0))).is_err());
        assert!(read_js_int(&None).is_err());
        assert!(matches!(
            read_js_int(&Some(json!("ZZZZZZZZZZZZZZZZZZZZ"))),
            Err(TabError::ParsingNumber { .. })
        ));
    }

    #[test]
    fn parse_election_config() {
        let js = json!({
            "outputSettings": {"contestName": "Board"},
            "rule": {"name": "majorityJudgment", "scale": {"type": "range", "low": 0, "high": 5}},
            "candidates": ["Alice", "Bob"],
            "ballots": [
                {"ballot": "Alice > Bob", "weight": 2.0},
                {"ballot": [["Bob"], ["Alice"]], "voter": "v2"},
                {"ballot": {"Alice": 4, "Bob": 1}},
                {"ballot": "Bob", "kind": "veto"}
            ],
            "source": {"provider": "csv", "filePath": "votes.csv", "firstVoteColumnIndex": "B"}
        });
        let config: ElectionConfig = serde_json::from_value(js).unwrap();
        assert_eq!(config.rule.scale, Some(Scale::range(0, 5)));
        assert_eq!(config.ballots[0].ballot, BallotInput::Text("Alice > Bob".to_string()));
        assert!(matches!(config.ballots[1].ballot, BallotInput::Order(_)));
        match &config.ballots[2].ballot {
            BallotInput::Levels(l) => assert_eq!(l["Alice"], Level::Int(4)),
            b => panic!("unexpected ballot {:?}", b),
        }
        let source = config.source.unwrap();
        assert_eq!(source.first_vote_column_index().unwrap(), 1);
        assert_eq!(source.first_vote_row_index().unwrap(), 1);
        assert_eq!(source.count_column_index_int().unwrap(), None);
        assert_eq!(source.tie_delimiter(), "~");
    }
}
