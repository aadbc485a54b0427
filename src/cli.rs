use datetime_index::Frequency;

/// Structure representing command-line arguments.
#[derive(Debug)]
pub struct Args {
    pub start: Option<String>,
    pub end: Option<String>,
    pub periods: Option<usize>,
    pub freq: Frequency,
    pub input: Option<std::path::PathBuf>,
    pub column: String,
    pub keys: Vec<String>,
    pub save: Option<std::path::PathBuf>,
    pub threads: Option<usize>,
}

/// Command-line arguments parser using Clap.
///
/// The index comes either from a generated date range (`--start`, `--end`,
/// `--periods`, `--freq`) or from a timestamp column of a CSV file (`--input`).
impl Args {
    /// Parses command-line arguments using `clap`.
    ///
    /// # Returns
    /// * `Args` - Struct containing parsed arguments.
    ///
    /// # Errors
    /// * Exits with a usage message if arguments are missing or invalid.
    pub fn parse() -> Self {
        let matches = clap::Command::new("dtindex")
            .version("0.1.0")
            .about("Build a date index and resolve date keys against it")
            .arg(
                clap::Arg::new("start")
                    .short('s')
                    .long("start")
                    .help("First timestamp of a generated range, e.g. 2012-02-01")
                    .num_args(1)
                    .conflicts_with("input"),
            )
            .arg(
                clap::Arg::new("end")
                    .short('e')
                    .long("end")
                    .help("Last timestamp of a generated range (inclusive)")
                    .num_args(1)
                    .conflicts_with("input"),
            )
            .arg(
                clap::Arg::new("periods")
                    .short('p')
                    .long("periods")
                    .help("Number of timestamps to generate")
                    .num_args(1)
                    .value_parser(clap::builder::ValueParser::new(parse_usize_positive))
                    .conflicts_with("input"),
            )
            .arg(
                clap::Arg::new("freq")
                    .short('f')
                    .long("freq")
                    .help("Frequency code: S, M, H, D, B, W-MON, MB, ME, YB, YE or a multiple such as 15M")
                    .num_args(1)
                    .default_value("D")
                    .value_parser(clap::builder::ValueParser::new(parse_frequency)),
            )
            .arg(
                clap::Arg::new("input")
                    .short('i')
                    .long("input")
                    .help("CSV file with a header row to read timestamps from")
                    .num_args(1),
            )
            .arg(
                clap::Arg::new("column")
                    .short('c')
                    .long("column")
                    .help("CSV column holding the timestamps")
                    .num_args(1)
                    .default_value("timestamp")
                    .requires("input"),
            )
            .arg(
                clap::Arg::new("key")
                    .short('k')
                    .long("key")
                    .help("Key to resolve: 2012, 2012-4-4, 2012-4-4 22:00, or a range 2012-1..2012-3")
                    .num_args(1)
                    .action(clap::ArgAction::Append),
            )
            .arg(
                clap::Arg::new("save")
                    .long("save")
                    .help("Write the index to the .idx companion of this path")
                    .num_args(1),
            )
            .arg(
                clap::Arg::new("threads")
                    .short('t')
                    .long("threads")
                    .help("Number of threads for batch resolution (default: all available)")
                    .num_args(1)
                    .value_parser(clap::builder::ValueParser::new(parse_usize_positive)),
            )
            .get_matches();

        Args {
            start: matches.get_one::<String>("start").cloned(),
            end: matches.get_one::<String>("end").cloned(),
            periods: matches.get_one::<usize>("periods").cloned(),
            freq: matches
                .get_one::<Frequency>("freq")
                .copied()
                .unwrap_or_default(),
            input: matches
                .get_one::<String>("input")
                .map(std::path::PathBuf::from),
            column: matches
                .get_one::<String>("column")
                .cloned()
                .unwrap_or_else(|| "timestamp".to_string()),
            keys: matches
                .get_many::<String>("key")
                .map(|keys| keys.cloned().collect())
                .unwrap_or_default(),
            save: matches.get_one::<String>("save").map(std::path::PathBuf::from),
            threads: matches.get_one::<usize>("threads").cloned(),
        }
    }
}

/// Validates that a count is a positive integer.
///
/// # Arguments
/// * `s` - String representation of the count.
///
/// # Returns
/// * `Result<usize>` - Validated count.
fn parse_usize_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("Must be a positive integer".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Not a valid number: {}", e)),
    }
}

fn parse_frequency(s: &str) -> Result<Frequency, String> {
    s.parse::<Frequency>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_must_be_positive() {
        assert_eq!(parse_usize_positive("4"), Ok(4));
        assert!(parse_usize_positive("0").is_err());
        assert!(parse_usize_positive("four").is_err());
    }

    #[test]
    fn frequency_codes_are_validated() {
        assert_eq!(parse_frequency("H"), Ok(Frequency::Hourly));
        assert!(parse_frequency("fortnightly").is_err());
    }
}
