use snafu::prelude::*;

/// Errors that prevent a conversion or an evaluation from completing.
///
/// Profile inconsistencies (ballots whose candidates differ from the election) are
/// not errors: they are reported with `log::warn!` and the computation proceeds.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum VotingError {
    /// The input cannot be turned into the requested kind of ballot.
    #[snafu(display("Conversion error: {message}"))]
    Conversion { message: String },

    /// A restriction was requested with arguments that do not apply to this ballot.
    #[snafu(display("Restriction error: {message}"))]
    Restriction { message: String },

    /// A value lies outside its scale, or two values cannot be compared.
    #[snafu(display("Scale mismatch: {message}"))]
    ScaleMismatch { message: String },

    /// The `Unambiguous` priority was asked to choose among several candidates.
    #[snafu(display("Ambiguous tie between candidates {candidates:?}"))]
    AmbiguousTie { candidates: Vec<String> },

    #[snafu(display("Could not parse order {input:?}: {message}"))]
    OrderParse { input: String, message: String },

    /// Weights or voters that do not fit the ballots.
    #[snafu(display("Invalid profile: {message}"))]
    InvalidProfile { message: String },

    /// The combination of ballot family and target shape is not supported.
    #[snafu(display("Unsupported operation: {message}"))]
    Unsupported { message: String },
}

pub type VotingResult<T> = Result<T, VotingError>;
