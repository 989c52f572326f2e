use std::path::Path;

use social_choice::{candidate_set, CandidateSet, Level};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// The candidates of one cell of a ranking, tied when separated by `delimiter`.
/// A blank cell is a skipped rank.
pub fn split_cell(cell: &str, delimiter: &str) -> CandidateSet {
    let names: Vec<&str> = cell
        .split(delimiter)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    candidate_set(&names)
}

/// Reads a grade: an integer, a float, or else a label. A blank cell is no grade.
pub fn parse_level(cell: &str) -> Option<Level> {
    let s = cell.trim();
    if s.is_empty() {
        None
    } else if let Ok(i) = s.parse::<i64>() {
        Some(Level::Int(i))
    } else if let Ok(f) = s.parse::<f64>() {
        Some(Level::Float(f))
    } else {
        Some(Level::Label(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(split_cell(" a ~ b", "~"), candidate_set(&["a", "b"]));
        assert!(split_cell("  ", "~").is_empty());
        assert_eq!(parse_level("3"), Some(Level::Int(3)));
        assert_eq!(parse_level("0.5"), Some(Level::Float(0.5)));
        assert_eq!(parse_level(" Good "), Some(Level::Label("Good".to_string())));
        assert_eq!(parse_level(""), None);
        assert_eq!(make_default_id("/tmp/votes.csv")(3), "votes.csv-00000003");
    }
}
