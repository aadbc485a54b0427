use datetime_index::{DateIndex, Key, Selection};

/// Configures a custom Rayon thread pool with specified size.
///
/// # Arguments
/// * `num_threads` - Desired number of threads for the pool.
///
/// # Returns
/// * `Result<ThreadPool>` - Created thread pool or an error if creation fails.
pub fn configure_thread_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))
}

/// Number of threads to use for a requested count, capped at the available CPUs.
///
/// Without a request the size of the global Rayon pool is used.
pub fn effective_threads(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => {
            let max_threads = num_cpus::get();
            if n > max_threads {
                println!("⚠️ Warning: Limiting thread count to {} (max available)", max_threads);
                max_threads
            } else {
                n
            }
        }
        None => rayon::current_num_threads(),
    }
}

/// One-line summary of an index: length, bounds and frequency.
pub fn describe_index(index: &DateIndex) -> String {
    let frequency = index
        .frequency()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "irregular".to_string());
    match (index.first(), index.last()) {
        (Some(first), Some(last)) => format!(
            "{} timestamp(s) from {} to {}, frequency {}",
            index.len(),
            first,
            last,
            frequency
        ),
        _ => "empty index".to_string(),
    }
}

/// Formats the outcome of resolving `key`, naming the matched timestamps.
///
/// # Example Output
/// ```text
///  - 2012-04-04 22:00:00 -> position 22 (2012-04-04 22:00:00)
///  - 2012-04-04 -> positions 0..24 (2012-04-04 00:00:00 ..= 2012-04-04 23:00:00)
/// ```
pub fn describe_selection(index: &DateIndex, key: &Key, selection: &Selection) -> String {
    let label = |position: usize| {
        index
            .get(position)
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    match selection {
        Selection::Exact(position) => {
            format!(" - {} -> position {} ({})", key, position, label(*position))
        }
        Selection::Range(range) if range.is_empty() => format!(" - {} -> no positions", key),
        Selection::Range(range) => format!(
            " - {} -> positions {}..{} ({} ..= {})",
            key,
            range.start,
            range.end,
            label(range.start),
            label(range.end - 1)
        ),
        Selection::NotFound => format!(" - {} -> not found", key),
    }
}
