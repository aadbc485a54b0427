//! Lookup keys and the literal grammar that produces them.
//!
//! Accepted literals:
//!
//! ```text
//! YYYY
//! YYYY-M[M]
//! YYYY-M[M]-D[D]
//! YYYY-M[M]-D[D] HH[:MM[:SS[.fffffffff]]]   (space or 'T' before the time)
//! any of the above with a trailing 'Z' or ±HH[:MM] after the time
//! A..B                                       (inclusive range of two of the above)
//! ```
//!
//! The precision of a point literal is the finest field present. Literals
//! down to the second become [`Key::Full`], anything coarser a [`Key::Partial`].

use crate::error::{Error, Result};
use crate::timestamp::{Precision, Timestamp};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// A lookup key.
///
/// A key written without an offset names local calendar time. Resolved
/// against an index whose timestamps carry an offset, it is read in that
/// offset, so `"2012-1-1"` covers the local day rather than the UTC day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// Matches one instant exactly.
    Full(Timestamp),
    /// Matches every instant whose truncation to the precision equals the timestamp.
    Partial(Timestamp, Precision),
    /// Inclusive span from the earliest match of the first key to the latest match of the second.
    Range(Box<Key>, Box<Key>),
}

/// Upper end of the interval a key covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upper {
    Inclusive(Timestamp),
    Exclusive(Timestamp),
    Unbounded,
}

impl Key {
    pub fn parse(input: &str) -> Result<Key> {
        let trimmed = input.trim();
        match trimmed.split_once("..") {
            Some((start, end)) => Key::range(parse_point(start)?, parse_point(end)?),
            None => parse_point(trimmed),
        }
    }

    /// Second precision (with or without a fraction) is already a full key.
    pub fn partial(timestamp: Timestamp, precision: Precision) -> Key {
        if precision == Precision::Second {
            Key::Full(timestamp)
        } else {
            Key::Partial(timestamp.truncate(precision), precision)
        }
    }

    /// Builds a range key. Both ends must be point keys.
    pub fn range(start: Key, end: Key) -> Result<Key> {
        if matches!(start, Key::Range(..)) || matches!(end, Key::Range(..)) {
            return Err(Error::InvalidSpecification(
                "range bounds must be point keys".to_string(),
            ));
        }
        Ok(Key::Range(Box::new(start), Box::new(end)))
    }

    /// First instant covered by the key.
    pub fn lower(&self) -> Timestamp {
        match self {
            Key::Full(t) => *t,
            Key::Partial(t, precision) => t.truncate(*precision),
            Key::Range(start, _) => start.lower(),
        }
    }

    pub fn upper(&self) -> Upper {
        match self {
            Key::Full(t) => Upper::Inclusive(*t),
            Key::Partial(t, precision) => t
                .ceil(*precision)
                .map_or(Upper::Unbounded, Upper::Exclusive),
            Key::Range(_, end) => end.upper(),
        }
    }

    /// The same key with every offset-less timestamp read as local time at `offset`.
    pub fn in_offset(&self, offset: FixedOffset) -> Key {
        let local = |t: &Timestamp| match t.offset() {
            Some(_) => *t,
            None => t.with_offset(offset),
        };
        match self {
            Key::Full(t) => Key::Full(local(t)),
            Key::Partial(t, precision) => Key::Partial(local(t), *precision),
            Key::Range(start, end) => Key::Range(
                Box::new(start.in_offset(offset)),
                Box::new(end.in_offset(offset)),
            ),
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Full(t) => write!(f, "{t}"),
            Key::Partial(t, precision) => {
                let pattern = match precision {
                    Precision::Year => "%Y",
                    Precision::Month => "%Y-%m",
                    Precision::Day => "%Y-%m-%d",
                    Precision::Hour => "%Y-%m-%d %H",
                    Precision::Minute => "%Y-%m-%d %H:%M",
                    Precision::Second => "%Y-%m-%d %H:%M:%S%.f",
                };
                write!(f, "{}", t.naive().format(pattern))?;
                if let Some(offset) = t.offset() {
                    write!(f, "{offset}")?;
                }
                Ok(())
            }
            Key::Range(start, end) => write!(f, "{start}..{end}"),
        }
    }
}

fn parse_point(input: &str) -> Result<Key> {
    let (timestamp, precision) = parse_partial(input)?;
    Ok(Key::partial(timestamp, precision))
}

/// Parses a point literal into its floored timestamp and inferred precision.
pub(crate) fn parse_partial(input: &str) -> Result<(Timestamp, Precision)> {
    let literal = input.trim();
    if literal.is_empty() {
        return Err(Error::parse(input, "empty date literal"));
    }

    let (date_part, time_part) = match literal.find([' ', 'T']) {
        Some(at) => (&literal[..at], Some(literal[at + 1..].trim())),
        None => (literal, None),
    };

    let date_fields: Vec<&str> = date_part.split('-').collect();
    if date_fields.len() > 3 || date_fields.iter().any(|f| f.is_empty()) {
        return Err(Error::parse(input, "expected YYYY[-MM[-DD]]"));
    }
    let year: i32 = number(input, date_fields[0], "year")?;
    let month: u32 = date_fields
        .get(1)
        .map(|f| number(input, f, "month"))
        .transpose()?
        .unwrap_or(1);
    let day: u32 = date_fields
        .get(2)
        .map(|f| number(input, f, "day"))
        .transpose()?
        .unwrap_or(1);
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::parse(input, "no such calendar date"))?;
    let date_precision = match date_fields.len() {
        1 => Precision::Year,
        2 => Precision::Month,
        _ => Precision::Day,
    };

    let Some(time_part) = time_part else {
        return Ok((Timestamp::from(date), date_precision));
    };
    if date_precision != Precision::Day {
        return Err(Error::parse(input, "a time of day requires a full date"));
    }

    let (clock, offset) = split_offset(input, time_part)?;
    let clock_fields: Vec<&str> = clock.split(':').collect();
    if clock_fields.len() > 3 || clock_fields.iter().any(|f| f.is_empty()) {
        return Err(Error::parse(input, "expected HH[:MM[:SS]]"));
    }
    let hour: u32 = number(input, clock_fields[0], "hour")?;
    let minute: u32 = clock_fields
        .get(1)
        .map(|f| number(input, f, "minute"))
        .transpose()?
        .unwrap_or(0);
    let (second, nano) = match clock_fields.get(2) {
        Some(field) => seconds(input, field)?,
        None => (0, 0),
    };
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nano)
        .ok_or_else(|| Error::parse(input, "no such time of day"))?;
    let precision = match clock_fields.len() {
        1 => Precision::Hour,
        2 => Precision::Minute,
        _ => Precision::Second,
    };

    let mut timestamp = Timestamp::new(NaiveDateTime::new(date, time));
    if let Some(offset) = offset {
        timestamp = timestamp.with_offset(offset);
    }
    Ok((timestamp, precision))
}

fn number<T: std::str::FromStr>(input: &str, field: &str, name: &str) -> Result<T> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(input, format!("{name} '{field}' is not a number")));
    }
    field
        .parse()
        .map_err(|_| Error::parse(input, format!("{name} '{field}' is out of range")))
}

fn seconds(input: &str, field: &str) -> Result<(u32, u32)> {
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (field, None),
    };
    let second = number(input, whole, "second")?;
    let nano = match fraction {
        None => 0,
        Some(digits) if digits.is_empty() || digits.len() > 9 => {
            return Err(Error::parse(input, "fraction must have 1 to 9 digits"));
        }
        Some(digits) => {
            let value: u32 = number(input, digits, "fraction")?;
            value * 10u32.pow(9 - digits.len() as u32)
        }
    };
    Ok((second, nano))
}

/// Splits a trailing `Z` / `±HH[:MM]` designator off the clock text.
fn split_offset<'a>(input: &str, time_part: &'a str) -> Result<(&'a str, Option<FixedOffset>)> {
    if let Some(clock) = time_part.strip_suffix(['Z', 'z']) {
        return Ok((clock.trim_end(), FixedOffset::east_opt(0)));
    }
    let Some(at) = time_part.find(['+', '-']) else {
        return Ok((time_part, None));
    };
    let (clock, designator) = time_part.split_at(at);
    let sign = if designator.starts_with('-') { -1 } else { 1 };
    let digits = designator[1..].replace(':', "");
    if !(digits.len() == 2 || digits.len() == 4) {
        return Err(Error::parse(input, "offset must be ±HH or ±HH:MM"));
    }
    let hours: i32 = number(input, &digits[..2], "offset hours")?;
    let minutes: i32 = if digits.len() == 4 {
        number(input, &digits[2..], "offset minutes")?
    } else {
        0
    };
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| Error::parse(input, "offset out of range"))?;
    Ok((clock.trim_end(), Some(offset)))
}

/// Anything a container accepts as a lookup key.
pub trait IntoKey {
    fn into_key(self) -> Result<Key>;
}

impl IntoKey for Key {
    fn into_key(self) -> Result<Key> {
        Ok(self)
    }
}

impl IntoKey for &Key {
    fn into_key(self) -> Result<Key> {
        Ok(self.clone())
    }
}

impl IntoKey for &str {
    fn into_key(self) -> Result<Key> {
        Key::parse(self)
    }
}

impl IntoKey for &String {
    fn into_key(self) -> Result<Key> {
        Key::parse(self)
    }
}

impl IntoKey for String {
    fn into_key(self) -> Result<Key> {
        Key::parse(&self)
    }
}

impl IntoKey for Timestamp {
    fn into_key(self) -> Result<Key> {
        Ok(Key::Full(self))
    }
}

impl IntoKey for NaiveDateTime {
    fn into_key(self) -> Result<Key> {
        Ok(Key::Full(Timestamp::new(self)))
    }
}

/// A bare date names the whole day.
impl IntoKey for NaiveDate {
    fn into_key(self) -> Result<Key> {
        Ok(Key::Partial(Timestamp::from(self), Precision::Day))
    }
}

impl<T: IntoKey> IntoKey for std::ops::RangeInclusive<T> {
    fn into_key(self) -> Result<Key> {
        let (start, end) = self.into_inner();
        Key::range(start.into_key()?, end.into_key()?)
    }
}
