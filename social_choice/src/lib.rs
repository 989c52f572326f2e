/*!
Ballots, conversions, scorers, pairwise matrices and voting rules.

Voters do not all express themselves the same way: some rank the candidates, some give
them grades, some just name one. This crate reads all of these as [`Ballot`]s, converts
them to the shape a rule needs, and computes the outcome of the rule.

```
use social_choice::*;

let ballots: Vec<RawBallot> = vec!["a > c > b".into(), "c > a > b".into()];
let outcome = Rule::borda().load_ballots(ballots.clone(), None, None, None)?;
assert_eq!(outcome.cowinners(), candidate_set(&["a", "c"]));

let tie_broken = Rule::borda().with_tie_break(Priority::Ascending);
let outcome = tie_broken.load_ballots(ballots, None, None, None)?;
assert_eq!(outcome.winner()?, Some("a".to_string()));
assert_eq!(outcome.strict_order()?, &["a", "c", "b"]);
# Ok::<(), VotingError>(())
```

See [`manual`] for the description of all the rules and their options.
*/

mod ballot;
pub mod builder;
mod config;
mod converter;
mod error;
mod level;
pub mod manual;
mod matrix;
mod parse;
mod priority;
mod profile;
mod rule;
mod scale;
mod scorer;

pub use crate::ballot::*;
pub use crate::config::*;
pub use crate::converter::*;
pub use crate::error::*;
pub use crate::level::Level;
pub use crate::matrix::*;
pub use crate::parse::parse_order;
pub use crate::priority::Priority;
pub use crate::profile::*;
pub use crate::rule::*;
pub use crate::scale::Scale;
pub use crate::scorer::*;
