mod cli;
mod utils;

use anyhow::Context;
use datetime_index::{DateIndex, DateRange, Key, Timestamp};

/// Main entry point of the application.
///
/// This function orchestrates the entire workflow:
/// 1. Parses command-line arguments.
/// 2. Builds the index from a CSV column or a generated date range.
/// 3. Resolves every requested key in a sized thread pool.
/// 4. Optionally saves the index to an `.idx` file.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Success or an error if any step fails.
fn main() -> anyhow::Result<()> {
    env_logger::init();
    let total_start = std::time::Instant::now();
    let args = cli::Args::parse();

    let effective_threads = utils::effective_threads(args.threads);
    println!("🚀 Using {} thread(s)", effective_threads);

    let index = build_index(&args)?;
    println!("📅 {}", utils::describe_index(&index));

    let keys = args
        .keys
        .iter()
        .map(|literal| Key::parse(literal).with_context(|| format!("Invalid key {:?}", literal)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if !keys.is_empty() {
        let local_pool = utils::configure_thread_pool(effective_threads)?;
        let selections = local_pool.install(|| index.resolve_many(&keys));
        for (key, selection) in keys.iter().zip(&selections) {
            println!("{}", utils::describe_selection(&index, key, selection));
        }
    }

    if let Some(path) = &args.save {
        let idx_path = datetime_index::save_index(&index, path)
            .with_context(|| format!("Failed to save index next to {}", path.display()))?;
        println!("💾 Index saved to {}", idx_path.display());
    }

    println!(
        "✅ Completed in {:?} seconds",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Builds the index the arguments describe.
///
/// # Errors
/// * If the CSV cannot be read or holds an invalid timestamp.
/// * If the range has neither a start nor an end, or cannot be generated.
fn build_index(args: &cli::Args) -> anyhow::Result<DateIndex> {
    if let Some(input) = &args.input {
        let stamps = datetime_index::read_timestamps_csv(input, &args.column)
            .with_context(|| format!("Failed to read timestamps from {}", input.display()))?;
        return Ok(DateIndex::from_raw(stamps).infer_frequency());
    }

    if args.start.is_none() && args.end.is_none() {
        return Err(anyhow::anyhow!("Either --input or --start/--end is required"));
    }
    let mut range = DateRange::new(args.freq);
    if let Some(start) = &args.start {
        range = range.start(parse_bound(start)?);
    }
    if let Some(end) = &args.end {
        range = range.end(parse_bound(end)?);
    }
    if let Some(periods) = args.periods {
        range = range.periods(periods);
    }
    DateIndex::date_range(&range).context("Failed to generate date range")
}

fn parse_bound(literal: &str) -> anyhow::Result<Timestamp> {
    Timestamp::parse(literal).with_context(|| format!("Invalid timestamp {:?}", literal))
}
