//! Index persistence and raw timestamp input.
//!
//! An index is saved next to its data file as a `.idx` companion serialized
//! with `bincode`. Raw timestamps are read from one column of a CSV file.

use crate::error::{Error, Result};
use crate::frequency::Frequency;
use crate::index::DateIndex;
use crate::timestamp::Timestamp;
use chrono::{FixedOffset, NaiveDateTime};
use std::path::{Path, PathBuf};

/// One timestamp as written to disk.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredTimestamp {
    pub datetime: NaiveDateTime,
    /// Offset east of UTC in seconds, if the timestamp carried one.
    pub offset_seconds: Option<i32>,
}

/// Index structure saved as `.idx` file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredIndex {
    pub timestamps: Vec<StoredTimestamp>,
    /// Generating frequency of a regular index.
    pub frequency: Option<Frequency>,
}

impl From<&Timestamp> for StoredTimestamp {
    fn from(timestamp: &Timestamp) -> Self {
        StoredTimestamp {
            datetime: timestamp.naive(),
            offset_seconds: timestamp.offset().map(|offset| offset.local_minus_utc()),
        }
    }
}

impl TryFrom<&StoredTimestamp> for Timestamp {
    type Error = Error;

    fn try_from(stored: &StoredTimestamp) -> Result<Self> {
        let timestamp = Timestamp::new(stored.datetime);
        match stored.offset_seconds {
            None => Ok(timestamp),
            Some(seconds) => FixedOffset::east_opt(seconds)
                .map(|offset| timestamp.with_offset(offset))
                .ok_or_else(|| Error::OutOfRange(format!("offset of {seconds} seconds"))),
        }
    }
}

impl From<&DateIndex> for StoredIndex {
    fn from(index: &DateIndex) -> Self {
        StoredIndex {
            timestamps: index.iter().map(StoredTimestamp::from).collect(),
            frequency: index.frequency(),
        }
    }
}

impl TryFrom<StoredIndex> for DateIndex {
    type Error = Error;

    /// Regular indexes are revalidated against their frequency; the rest must be
    /// strictly increasing.
    fn try_from(stored: StoredIndex) -> Result<Self> {
        let timestamps = stored
            .timestamps
            .iter()
            .map(Timestamp::try_from)
            .collect::<Result<Vec<_>>>()?;
        match stored.frequency {
            Some(frequency) => DateIndex::from_range(timestamps, frequency),
            None => DateIndex::from_raw_unique(timestamps),
        }
    }
}

/// Serializes an index to a companion `.idx` file.
///
/// The file has the same name as `output_path` with an `.idx` extension.
///
/// # Arguments
/// * `index` - Index to persist.
/// * `output_path` - Path of the data file the index belongs to.
///
/// # Returns
/// * `Result<PathBuf>` - Path of the written `.idx` file.
///
/// # Errors
/// * If serialization or file I/O fails.
pub fn save_index<P: AsRef<Path>>(index: &DateIndex, output_path: P) -> Result<PathBuf> {
    let idx_path = output_path.as_ref().with_extension("idx");
    let data = bincode::serialize(&StoredIndex::from(index))?;
    std::fs::write(&idx_path, data)?;
    log::debug!("saved {} timestamps to {}", index.len(), idx_path.display());
    Ok(idx_path)
}

/// Loads an index from an `.idx` file written by [`save_index`].
///
/// # Errors
/// * If the file cannot be read or decoded.
/// * If the stored timestamps are no longer valid for the stored frequency.
pub fn load_index<P: AsRef<Path>>(idx_path: P) -> Result<DateIndex> {
    let data = std::fs::read(idx_path.as_ref())?;
    let stored: StoredIndex = bincode::deserialize(&data)?;
    log::debug!(
        "loaded {} timestamps from {}",
        stored.timestamps.len(),
        idx_path.as_ref().display()
    );
    DateIndex::try_from(stored)
}

/// Reads the timestamps of one column of a CSV file with a header row.
///
/// Each cell accepts the same literals as [`Timestamp::parse`]. Rows keep file
/// order; sorting happens when the values are turned into an index.
///
/// # Errors
/// * [`Error::InvalidSpecification`] if the header has no such column.
/// * [`Error::Parse`] for a cell that is not a date literal.
/// * If the file cannot be read as CSV.
pub fn read_timestamps_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<Timestamp>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let position = column_position(reader.headers()?, column)?;

    let mut timestamps = Vec::new();
    for record in reader.records() {
        let record = record?;
        timestamps.push(Timestamp::parse(cell(&record, position, column)?)?);
    }
    log::debug!(
        "read {} timestamps from column {column:?} of {}",
        timestamps.len(),
        path.as_ref().display()
    );
    Ok(timestamps)
}

/// Reads `(timestamp, value)` pairs from two columns of a CSV file, in file order.
///
/// The pairs feed [`Vector::from_pairs`](crate::Vector::from_pairs), which keeps
/// every value with its own timestamp whatever order the rows are in.
///
/// # Errors
/// * [`Error::InvalidSpecification`] if the header lacks either column.
/// * [`Error::Parse`] for a cell that is not a date literal or not a `T`.
/// * If the file cannot be read as CSV.
pub fn read_series_csv<T, P>(path: P, time_column: &str, value_column: &str) -> Result<Vec<(Timestamp, T)>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    P: AsRef<Path>,
{
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?;
    let time_position = column_position(headers, time_column)?;
    let value_position = column_position(headers, value_column)?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let timestamp = Timestamp::parse(cell(&record, time_position, time_column)?)?;
        let text = cell(&record, value_position, value_column)?;
        let value = text
            .parse::<T>()
            .map_err(|e| Error::parse(text, format!("column {value_column:?}: {e}")))?;
        pairs.push((timestamp, value));
    }
    log::debug!(
        "read {} rows of {time_column:?}/{value_column:?} from {}",
        pairs.len(),
        path.as_ref().display()
    );
    Ok(pairs)
}

fn column_position(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|name| name.trim() == column)
        .ok_or_else(|| Error::InvalidSpecification(format!("no column named {column:?}")))
}

fn cell<'r>(record: &'r csv::StringRecord, position: usize, column: &str) -> Result<&'r str> {
    record
        .get(position)
        .map(str::trim)
        .ok_or_else(|| Error::parse(&format!("{record:?}"), format!("missing column {column:?}")))
}
