// Reads orders written as "a ~ b > c": `>` separates indifference classes from the most
// to the least preferred, `~` separates candidates inside a class.

use crate::config::*;
use crate::error::*;

pub fn parse_order(input: &str) -> VotingResult<Vec<CandidateSet>> {
    if input.trim().is_empty() {
        return Ok(vec![]);
    }
    let mut seen = CandidateSet::new();
    let mut classes: Vec<CandidateSet> = Vec::new();
    for chunk in input.split('>') {
        let mut class = CandidateSet::new();
        for name in chunk.split('~').map(|s| s.trim()) {
            if name.is_empty() {
                return OrderParseSnafu {
                    input,
                    message: "empty candidate name",
                }
                .fail();
            }
            if !seen.insert(name.to_string()) {
                return OrderParseSnafu {
                    input,
                    message: format!("candidate {:?} appears twice", name),
                }
                .fail();
            }
            class.insert(name.to_string());
        }
        classes.push(class);
    }
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_in_order() {
        let order = parse_order("a ~ b > c").unwrap();
        assert_eq!(order, vec![candidate_set(&["a", "b"]), candidate_set(&["c"])]);
        let single = parse_order("  Alice ").unwrap();
        assert_eq!(single, vec![candidate_set(&["Alice"])]);
    }

    #[test]
    fn empty_is_an_empty_order() {
        assert_eq!(parse_order("   ").unwrap(), Vec::<CandidateSet>::new());
    }

    #[test]
    fn malformed_inputs() {
        assert!(matches!(
            parse_order("a > > b"),
            Err(VotingError::OrderParse { .. })
        ));
        assert!(matches!(
            parse_order("a ~ b > a"),
            Err(VotingError::OrderParse { .. })
        ));
        assert!(parse_order("a ~").is_err());
    }
}
