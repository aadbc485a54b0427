//! Calendar instants with an optional fixed UTC offset.
//!
//! A [`Timestamp`] keeps its local calendar fields (what the user wrote) next
//! to the offset they were written in. Ordering, equality and hashing go
//! through the UTC instant, so `10:00+01:00` and `09:00Z` are the same key.
//! A timestamp without an offset is read as UTC.

use crate::error::{Error, Result};
use chrono::{Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Granularity of a partial date key, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    datetime: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl Timestamp {
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            offset: None,
        }
    }

    /// Reads the same local fields as being written in `offset`.
    pub fn with_offset(self, offset: FixedOffset) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::from_ymd_hms(year, month, day, 0, 0, 0)
    }

    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(Self::new)
            .ok_or_else(|| {
                Error::OutOfRange(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
                ))
            })
    }

    /// Parses any key literal that denotes a single point in time.
    ///
    /// Partial literals are floored to their precision, so `"2012"` yields
    /// 2012-01-01 00:00:00 and `"2012-4"` yields 2012-04-01 00:00:00.
    pub fn parse(input: &str) -> Result<Self> {
        let (timestamp, _) = crate::key::parse_partial(input)?;
        Ok(timestamp)
    }

    /// Local calendar fields.
    pub fn naive(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    pub fn year(&self) -> i32 {
        self.datetime.year()
    }

    pub fn month(&self) -> u32 {
        self.datetime.month()
    }

    pub fn day(&self) -> u32 {
        self.datetime.day()
    }

    pub fn hour(&self) -> u32 {
        self.datetime.hour()
    }

    pub fn minute(&self) -> u32 {
        self.datetime.minute()
    }

    pub fn second(&self) -> u32 {
        self.datetime.second()
    }

    pub fn nanosecond(&self) -> u32 {
        self.datetime.nanosecond()
    }

    pub fn weekday(&self) -> Weekday {
        self.datetime.weekday()
    }

    fn offset_seconds(&self) -> i64 {
        self.offset.map_or(0, |o| o.local_minus_utc() as i64)
    }

    /// Seconds since the Unix epoch and the sub-second nanos of the UTC instant.
    fn instant(&self) -> (i64, u32) {
        (
            self.datetime.and_utc().timestamp() - self.offset_seconds(),
            self.datetime.nanosecond(),
        )
    }

    /// Signed distance from `earlier` to `self` in nanoseconds.
    pub fn nanos_since(&self, earlier: &Timestamp) -> i128 {
        let (secs, nanos) = self.instant();
        let (other_secs, other_nanos) = earlier.instant();
        (secs as i128 - other_secs as i128) * 1_000_000_000 + (nanos as i128 - other_nanos as i128)
    }

    /// The same instant expressed in `other`'s offset.
    pub fn to_offset_of(&self, other: &Timestamp) -> Option<Timestamp> {
        let shift = other.offset_seconds() - self.offset_seconds();
        self.datetime
            .checked_add_signed(Duration::seconds(shift))
            .map(|datetime| Timestamp {
                datetime,
                offset: other.offset,
            })
    }

    /// Applies calendar arithmetic to the local fields, keeping the offset.
    pub(crate) fn map_local(
        &self,
        step: impl FnOnce(NaiveDateTime) -> Option<NaiveDateTime>,
    ) -> Result<Self> {
        step(self.datetime)
            .map(|datetime| Timestamp {
                datetime,
                offset: self.offset,
            })
            .ok_or_else(|| Error::OutOfRange(format!("calendar step from {self}")))
    }

    /// Moves to another date at the same local time of day.
    pub(crate) fn map_date(&self, step: impl FnOnce(NaiveDate) -> Option<NaiveDate>) -> Result<Self> {
        let time = self.datetime.time();
        self.map_local(|datetime| step(datetime.date()).map(|date| date.and_time(time)))
    }

    pub(crate) fn add_months(&self, months: u32) -> Result<Self> {
        self.map_local(|datetime| datetime.checked_add_months(Months::new(months)))
    }

    pub(crate) fn sub_months(&self, months: u32) -> Result<Self> {
        self.map_local(|datetime| datetime.checked_sub_months(Months::new(months)))
    }

    /// Floors the local fields to `precision`.
    pub fn truncate(&self, precision: Precision) -> Self {
        let dt = self.datetime;
        let in_second = dt.nanosecond() as i64;
        let in_minute = dt.second() as i64 * 1_000_000_000 + in_second;
        let in_hour = dt.minute() as i64 * 60_000_000_000 + in_minute;
        let in_day = dt.hour() as i64 * 3_600_000_000_000 + in_hour;
        let elapsed = match precision {
            Precision::Second => Duration::nanoseconds(in_second),
            Precision::Minute => Duration::nanoseconds(in_minute),
            Precision::Hour => Duration::nanoseconds(in_hour),
            Precision::Day => Duration::nanoseconds(in_day),
            Precision::Month => Duration::days(dt.day0() as i64) + Duration::nanoseconds(in_day),
            Precision::Year => Duration::days(dt.ordinal0() as i64) + Duration::nanoseconds(in_day),
        };
        Timestamp {
            datetime: dt - elapsed,
            offset: self.offset,
        }
    }

    /// Exclusive upper bound of the interval `self` denotes at `precision`.
    ///
    /// `None` when the bound falls outside the representable calendar.
    pub fn ceil(&self, precision: Precision) -> Option<Self> {
        let floor = self.truncate(precision).datetime;
        let datetime = match precision {
            Precision::Year => floor.checked_add_months(Months::new(12)),
            Precision::Month => floor.checked_add_months(Months::new(1)),
            Precision::Day => floor.checked_add_signed(Duration::days(1)),
            Precision::Hour => floor.checked_add_signed(Duration::hours(1)),
            Precision::Minute => floor.checked_add_signed(Duration::minutes(1)),
            Precision::Second => floor.checked_add_signed(Duration::seconds(1)),
        }?;
        Some(Timestamp {
            datetime,
            offset: self.offset,
        })
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.instant().cmp(&other.instant())
    }
}

impl std::hash::Hash for Timestamp {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.instant().hash(state);
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::new(datetime)
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<chrono::DateTime<FixedOffset>> for Timestamp {
    fn from(datetime: chrono::DateTime<FixedOffset>) -> Self {
        Self::new(datetime.naive_local()).with_offset(*datetime.offset())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(datetime: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(datetime.naive_utc())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.datetime.format("%Y-%m-%d %H:%M:%S%.f"))?;
        if let Some(offset) = self.offset {
            write!(f, "{offset}")?;
        }
        Ok(())
    }
}
