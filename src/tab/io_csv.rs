// Primitives for reading CSV files.

use std::collections::BTreeMap;
use std::fs::File;

use social_choice::*;

use crate::tab::{
    io_common::{make_default_id, parse_level, split_cell},
    *,
};

/// One ballot per row: the columns are the successive ranks, starting at the first vote
/// column. A cell may hold several tied candidates.
pub fn read_csv_ranking(path: &str, cfs: &FileSource, ctx: &BallotContext) -> TabResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let (id, count) = read_id_count(&line, cfs, lineno, &default_id)?;

        let mut seen = CandidateSet::new();
        let mut classes: Vec<CandidateSet> = Vec::new();
        for cell in line.iter().skip(choices_start_col) {
            let class: CandidateSet = split_cell(cell, cfs.tie_delimiter())
                .into_iter()
                .filter(|c| {
                    if seen.contains(c) {
                        warn!("read_csv_ranking: {}: skipping duplicate candidate {:?}", id, c);
                        false
                    } else {
                        true
                    }
                })
                .collect();
            seen.extend(class.iter().cloned());
            classes.push(class);
        }
        classes.retain(|c| !c.is_empty());
        debug!("read_csv_ranking: lineno: {:?} row: {:?}", lineno, &classes);

        let ballot = match ctx.candidates.as_ref() {
            Some(cands) => RawBallot::Ballot(Ballot::Order(
                BallotOrder::new(classes, Some(cands.clone())).context(InvalidBallotSnafu { id: id.clone() })?,
            )),
            None => RawBallot::Order(classes),
        };
        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices: ballot,
        });
    }
    Ok(res)
}

/// A header row with the names of the candidates, then one ballot per row with a grade
/// in each cell. A blank cell leaves the candidate ungraded.
pub fn read_csv_levels(path: &str, cfs: &FileSource, ctx: &BallotContext) -> TabResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let choices_start_col = cfs.first_vote_column_index()?;

    let (mut records, row_offset) = get_records(path, cfs)?;
    let header = match records.next() {
        Some(line_r) => line_r.context(CsvLineParseSnafu {})?,
        None => return Ok(vec![]),
    };
    let names: Vec<String> = header
        .iter()
        .skip(choices_start_col)
        .map(|s| s.trim().to_string())
        .collect();
    let candidates = match ctx.candidates.as_ref() {
        Some(cands) => cands.clone(),
        None => candidate_set(&names),
    };
    info!("read_csv_levels: candidates {:?}", names);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let (id, count) = read_id_count(&line, cfs, lineno, &default_id)?;

        let mut levels: BTreeMap<Candidate, Level> = BTreeMap::new();
        for (name, cell) in names.iter().zip(line.iter().skip(choices_start_col)) {
            if let Some(level) = parse_level(cell) {
                levels.insert(name.clone(), level);
            }
        }
        debug!("read_csv_levels: lineno: {:?} row: {:?}", lineno, &levels);

        let ballot = BallotLevels::new(levels, Some(candidates.clone()), ctx.scale.clone())
            .context(InvalidBallotSnafu { id: id.clone() })?;
        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices: RawBallot::Ballot(Ballot::Levels(ballot)),
        });
    }
    Ok(res)
}

fn read_id_count(
    line: &csv::StringRecord,
    cfs: &FileSource,
    lineno: usize,
    default_id: &impl Fn(usize) -> String,
) -> TabResult<(String, Option<f64>)> {
    let id = if let Some(id_idx) = cfs.id_column_index_int()? {
        line.get(id_idx).context(CsvLineTooShortSnafu { lineno })?.to_string()
    } else {
        default_id(lineno)
    };
    let count = if let Some(count_idx) = cfs.count_column_index_int()? {
        let s = line.get(count_idx).context(CsvLineTooShortSnafu { lineno })?.trim();
        Some(s.parse::<f64>().ok().context(ParsingNumberSnafu { value: s })?)
    } else {
        None
    };
    Ok((id, count))
}

fn get_records(path: &str, cfs: &FileSource) -> TabResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the excel world
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::tests::write_temp;

    #[test]
    fn ranking_with_ties_and_counts() {
        let path = write_temp(
            "ranking_with_ties_and_counts.csv",
            "id,count,r1,r2,r3\nv1,2,a,b ~ c,\nv2,1,c,,a\nv3,1,b,b,a\n",
        );
        let cfs: FileSource = serde_json::from_value(serde_json::json!({
            "provider": "csv",
            "filePath": path,
            "firstVoteColumnIndex": 3,
            "firstVoteRowIndex": 2,
            "idColumnIndex": 1,
            "countColumnIndex": 2,
        }))
        .unwrap();
        let ctx = BallotContext::default();
        let res = read_csv_ranking(&path, &cfs, &ctx).unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].id, Some("v1".to_string()));
        assert_eq!(res[0].count, Some(2.0));
        assert_eq!(
            res[0].choices,
            RawBallot::Order(vec![candidate_set(&["a"]), candidate_set(&["b", "c"])])
        );
        // A skipped rank and a duplicate.
        assert_eq!(
            res[1].choices,
            RawBallot::Order(vec![candidate_set(&["c"]), candidate_set(&["a"])])
        );
        assert_eq!(
            res[2].choices,
            RawBallot::Order(vec![candidate_set(&["b"]), candidate_set(&["a"])])
        );
    }

    #[test]
    fn ranking_with_declared_candidates() {
        let path = write_temp("ranking_with_declared_candidates.csv", "a,b\nz\n");
        let cfs = FileSource::new("csv", &path);
        let ctx = BallotContext {
            candidates: Some(candidate_set(&["a", "b", "c"])),
            scale: None,
        };
        let res = read_csv_ranking(&path, &cfs, &ctx);
        assert!(matches!(res, Err(TabError::InvalidBallot { .. })));
        let path = write_temp("ranking_with_declared_candidates_ok.csv", "a,b\n");
        let res = read_csv_ranking(&path, &cfs, &ctx).unwrap();
        match &res[0].choices {
            RawBallot::Ballot(Ballot::Order(b)) => {
                assert_eq!(b.as_weak_order(), &[candidate_set(&["a"]), candidate_set(&["b"])]);
                assert_eq!(b.candidates_not_in_b(), candidate_set(&["c"]));
            }
            b => panic!("unexpected ballot {:?}", b),
        }
    }

    #[test]
    fn levels_with_header() {
        let path = write_temp("levels_with_header.csv", "voter,a,b,c\nv1,Good,Poor,\nv2,Excellent,Good,Poor\n");
        let cfs: FileSource = serde_json::from_value(serde_json::json!({
            "provider": "csv_levels",
            "filePath": path,
            "firstVoteColumnIndex": "B",
            "idColumnIndex": "A",
        }))
        .unwrap();
        let scale = Scale::from_list(vec!["Poor", "Good", "Excellent"]);
        let ctx = BallotContext {
            candidates: None,
            scale: Some(scale.clone()),
        };
        let res = read_csv_levels(&path, &cfs, &ctx).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].id, Some("v1".to_string()));
        match &res[0].choices {
            RawBallot::Ballot(Ballot::Levels(b)) => {
                assert_eq!(b.get("a"), Some(&Level::from("Good")));
                assert_eq!(b.candidates_not_in_b(), candidate_set(&["c"]));
                assert_eq!(b.scale(), &scale);
            }
            b => panic!("unexpected ballot {:?}", b),
        }
    }
}
