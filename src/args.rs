use clap::Parser;

/// This is a tabulation program for elections with rankings, grades or single-name ballots.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON format: the rule, the
    /// candidates and the ballots (inline or from an input file). See the manual of the social_choice
    /// library for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, choicetab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. By default, it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the ballots are read from this file. Setting this option overrides the
    /// source that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv, csv_levels or json. See documentation for all the input types.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default plurality) The voting rule, for instance borda, majorityJudgment or kimRoush. Setting this option
    /// overrides the rule of the --config option.
    #[clap(long, value_parser)]
    pub rule: Option<String>,

    /// (unambiguous, ascending, descending or random) How to break the ties of the outcome.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// (integer) The seed of the random tie-break.
    #[clap(long, value_parser)]
    pub random_seed: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
