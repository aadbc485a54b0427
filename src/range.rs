use crate::error::{Error, Result};
use crate::frequency::Frequency;
use crate::timestamp::Timestamp;
use chrono::NaiveDateTime;

/// Description of a regularly spaced sequence of timestamps.
///
/// Exactly two of `start`, `end` and `periods` must be set before calling
/// [`DateRange::generate`].
///
/// # Example
///
/// ```
/// use datetime_index::{DateRange, Frequency, Timestamp};
///
/// let stamps = DateRange::new(Frequency::Daily)
///     .start(Timestamp::parse("2012-2-1")?)
///     .periods(3)
///     .generate()?;
/// assert_eq!(stamps[2], Timestamp::parse("2012-02-03")?);
/// # Ok::<(), datetime_index::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
    periods: Option<usize>,
    frequency: Frequency,
}

impl DateRange {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    pub fn start(mut self, start: impl Into<Timestamp>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<Timestamp>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn periods(mut self, periods: usize) -> Self {
        self.periods = Some(periods);
        self
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn generate(&self) -> Result<Vec<Timestamp>> {
        generate(self.start, self.end, self.periods, self.frequency)
    }
}

/// Produces the strictly increasing timestamps described by two of `start`, `end` and `periods`.
///
/// A `start` that the frequency cannot land on is snapped forward to the
/// next valid instant; an `end` is snapped back to the previous one.
pub fn generate(
    start: Option<Timestamp>,
    end: Option<Timestamp>,
    periods: Option<usize>,
    frequency: Frequency,
) -> Result<Vec<Timestamp>> {
    let stamps = match (start, end, periods) {
        (Some(start), None, Some(periods)) => forward(&frequency, &start, periods)?,
        (Some(start), Some(end), None) => between(&frequency, &start, &end)?,
        (None, Some(end), Some(periods)) => backward(&frequency, &end, periods)?,
        _ => {
            return Err(Error::InvalidSpecification(format!(
                "exactly two of start, end and periods are required (start: {}, end: {}, periods: {})",
                start.is_some(),
                end.is_some(),
                periods.is_some(),
            )));
        }
    };
    log::debug!(
        "generated {} timestamps at {frequency} ({:?} .. {:?})",
        stamps.len(),
        stamps.first().map(ToString::to_string),
        stamps.last().map(ToString::to_string),
    );
    Ok(stamps)
}

/// Upper bound on up-front allocation; longer ranges grow as they are generated.
const PREALLOCATE_LIMIT: usize = 4096;

/// Fails when `steps` more timestamps cannot fit between `first` and the calendar edge.
///
/// Only rejects counts beyond the edge by more than one step; the walk
/// itself reports the exact overflow.
fn check_room(frequency: &Frequency, steps: usize, available: usize, first: &Timestamp) -> Result<()> {
    if steps > available.saturating_add(1) {
        return Err(Error::OutOfRange(format!(
            "{steps} steps of {frequency} from {first} pass the calendar edge"
        )));
    }
    Ok(())
}

/// Edge of the representable calendar in the offset of `like`.
fn calendar_edge(datetime: NaiveDateTime, like: &Timestamp) -> Timestamp {
    let edge = Timestamp::new(datetime);
    match like.offset() {
        Some(offset) => edge.with_offset(offset),
        None => edge,
    }
}

fn forward(frequency: &Frequency, start: &Timestamp, periods: usize) -> Result<Vec<Timestamp>> {
    if periods == 0 {
        return Ok(Vec::new());
    }
    let mut current = frequency.rollforward(start)?;
    if periods > PREALLOCATE_LIMIT {
        let available = frequency.count_between(&current, &calendar_edge(NaiveDateTime::MAX, &current));
        check_room(frequency, periods - 1, available, &current)?;
    }
    let mut stamps = Vec::with_capacity(periods.min(PREALLOCATE_LIMIT));
    stamps.push(current);
    for _ in 1..periods {
        current = frequency.advance(&current)?;
        stamps.push(current);
    }
    Ok(stamps)
}

fn between(frequency: &Frequency, start: &Timestamp, end: &Timestamp) -> Result<Vec<Timestamp>> {
    let first = frequency.rollforward(start)?;
    if first > *end {
        return Ok(Vec::new());
    }
    let expected = frequency.count_between(&first, end).saturating_add(1);
    let mut stamps = Vec::with_capacity(expected.min(PREALLOCATE_LIMIT));
    let mut current = first;
    loop {
        stamps.push(current);
        match frequency.advance(&current) {
            Ok(next) if next <= *end => current = next,
            Ok(_) => break,
            // Past the calendar's last representable instant, hence past `end`.
            Err(Error::OutOfRange(_)) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(stamps)
}

fn backward(frequency: &Frequency, end: &Timestamp, periods: usize) -> Result<Vec<Timestamp>> {
    if periods == 0 {
        return Ok(Vec::new());
    }
    let mut current = frequency.rollback(end)?;
    if periods > PREALLOCATE_LIMIT {
        let available = frequency.count_between(&calendar_edge(NaiveDateTime::MIN, &current), &current);
        check_room(frequency, periods - 1, available, &current)?;
    }
    let mut stamps = Vec::with_capacity(periods.min(PREALLOCATE_LIMIT));
    stamps.push(current);
    for _ in 1..periods {
        current = frequency.retreat(&current)?;
        stamps.push(current);
    }
    stamps.reverse();
    Ok(stamps)
}
