//! Sampling intervals and their calendar rules.
//!
//! Every [`Frequency`] answers two questions: which instant comes next
//! ([`Frequency::advance`]) and how many steps separate two instants
//! ([`Frequency::count_between`]). Tick frequencies (seconds through weeks)
//! step by a fixed duration and accept any instant as a starting point.
//! Anchored frequencies (business days, weekdays, month and year boundaries)
//! only land on particular dates and keep the local time of day.

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Which end of a month or year an anchored frequency lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Anchor {
    Begin,
    End,
}

/// Base unit of a [`Frequency::Custom`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Fixed length of the unit; months and years have none.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            TimeUnit::Second => Some(Duration::seconds(1)),
            TimeUnit::Minute => Some(Duration::minutes(1)),
            TimeUnit::Hour => Some(Duration::hours(1)),
            TimeUnit::Day => Some(Duration::days(1)),
            TimeUnit::Week => Some(Duration::weeks(1)),
            TimeUnit::Month | TimeUnit::Year => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TimeUnit::Second => "S",
            TimeUnit::Minute => "M",
            TimeUnit::Hour => "H",
            TimeUnit::Day => "D",
            TimeUnit::Week => "W",
            TimeUnit::Month => "MONTH",
            TimeUnit::Year => "YEAR",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    #[default]
    Daily,
    /// Monday through Friday.
    BusinessDaily,
    Weekly(Weekday),
    Monthly(Anchor),
    Yearly(Anchor),
    /// `step` units at a time, e.g. two weeks. Month and year steps keep the
    /// day of month, clamped to the length of the target month.
    Custom { step: u32, unit: TimeUnit },
}

impl Frequency {
    pub fn every(step: u32, unit: TimeUnit) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidSpecification(
                "frequency step must be positive".to_string(),
            ));
        }
        Ok(Frequency::Custom { step, unit })
    }

    /// Constant spacing of a tick frequency.
    pub fn fixed_step(&self) -> Option<Duration> {
        match self {
            Frequency::Secondly => TimeUnit::Second.duration(),
            Frequency::Minutely => TimeUnit::Minute.duration(),
            Frequency::Hourly => TimeUnit::Hour.duration(),
            Frequency::Daily => TimeUnit::Day.duration(),
            Frequency::Custom { step, unit } => {
                let step = i32::try_from(*step).ok().filter(|s| *s > 0)?;
                unit.duration()?.checked_mul(step)
            }
            _ => None,
        }
    }

    /// Whether `t` is an instant this frequency can land on.
    pub fn is_on_offset(&self, t: &Timestamp) -> bool {
        let date = t.date();
        match self {
            Frequency::BusinessDaily => is_business_day(date),
            Frequency::Weekly(weekday) => date.weekday() == *weekday,
            Frequency::Monthly(Anchor::Begin) => date.day() == 1,
            Frequency::Monthly(Anchor::End) => Some(date) == last_of_month(date),
            Frequency::Yearly(Anchor::Begin) => date.ordinal() == 1,
            Frequency::Yearly(Anchor::End) => date.month() == 12 && date.day() == 31,
            _ => true,
        }
    }

    /// Next valid instant strictly after `t`.
    pub fn advance(&self, t: &Timestamp) -> Result<Timestamp> {
        if let Some(step) = self.fixed_step() {
            return t.map_local(|dt| dt.checked_add_signed(step));
        }
        match self {
            Frequency::Custom { step, unit } => t.add_months(calendar_months(*step, *unit)?),
            Frequency::BusinessDaily => t.map_date(|date| {
                let mut next = date.succ_opt()?;
                while !is_business_day(next) {
                    next = next.succ_opt()?;
                }
                Some(next)
            }),
            Frequency::Weekly(weekday) => t.map_date(|date| {
                let ahead = (6 + weekday.num_days_from_monday() - date.weekday().num_days_from_monday()) % 7 + 1;
                date.checked_add_signed(Duration::days(ahead as i64))
            }),
            Frequency::Monthly(Anchor::Begin) => {
                t.map_date(|date| first_of_month(date)?.checked_add_months(chrono::Months::new(1)))
            }
            Frequency::Monthly(Anchor::End) => t.map_date(|date| {
                let last = last_of_month(date)?;
                if date < last {
                    Some(last)
                } else {
                    last_of_month(last.succ_opt()?)
                }
            }),
            Frequency::Yearly(Anchor::Begin) => {
                t.map_date(|date| NaiveDate::from_ymd_opt(date.year().checked_add(1)?, 1, 1))
            }
            Frequency::Yearly(Anchor::End) => t.map_date(|date| {
                let end = NaiveDate::from_ymd_opt(date.year(), 12, 31)?;
                if date < end {
                    Some(end)
                } else {
                    NaiveDate::from_ymd_opt(date.year().checked_add(1)?, 12, 31)
                }
            }),
            Frequency::Secondly | Frequency::Minutely | Frequency::Hourly | Frequency::Daily => {
                Err(Error::InvalidSpecification(format!("{self} has no fixed step")))
            }
        }
    }

    /// Previous valid instant strictly before `t`.
    pub fn retreat(&self, t: &Timestamp) -> Result<Timestamp> {
        if let Some(step) = self.fixed_step() {
            return t.map_local(|dt| dt.checked_sub_signed(step));
        }
        match self {
            Frequency::Custom { step, unit } => t.sub_months(calendar_months(*step, *unit)?),
            Frequency::BusinessDaily => t.map_date(|date| {
                let mut prev = date.pred_opt()?;
                while !is_business_day(prev) {
                    prev = prev.pred_opt()?;
                }
                Some(prev)
            }),
            Frequency::Weekly(weekday) => t.map_date(|date| {
                let back = (6 + date.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7 + 1;
                date.checked_sub_signed(Duration::days(back as i64))
            }),
            Frequency::Monthly(Anchor::Begin) => t.map_date(|date| {
                let first = first_of_month(date)?;
                if date > first {
                    Some(first)
                } else {
                    first.checked_sub_months(chrono::Months::new(1))
                }
            }),
            Frequency::Monthly(Anchor::End) => t.map_date(|date| first_of_month(date)?.pred_opt()),
            Frequency::Yearly(Anchor::Begin) => t.map_date(|date| {
                let begin = NaiveDate::from_ymd_opt(date.year(), 1, 1)?;
                if date > begin {
                    Some(begin)
                } else {
                    NaiveDate::from_ymd_opt(date.year().checked_sub(1)?, 1, 1)
                }
            }),
            Frequency::Yearly(Anchor::End) => {
                t.map_date(|date| NaiveDate::from_ymd_opt(date.year().checked_sub(1)?, 12, 31))
            }
            Frequency::Secondly | Frequency::Minutely | Frequency::Hourly | Frequency::Daily => {
                Err(Error::InvalidSpecification(format!("{self} has no fixed step")))
            }
        }
    }

    /// First valid instant at or after `t`.
    pub fn rollforward(&self, t: &Timestamp) -> Result<Timestamp> {
        if self.is_on_offset(t) {
            Ok(*t)
        } else {
            self.advance(t)
        }
    }

    /// Last valid instant at or before `t`.
    pub fn rollback(&self, t: &Timestamp) -> Result<Timestamp> {
        if self.is_on_offset(t) {
            Ok(*t)
        } else {
            self.retreat(t)
        }
    }

    /// Number of times `advance` can be applied from `a` without passing `b`.
    ///
    /// Zero when `b <= a`.
    pub fn count_between(&self, a: &Timestamp, b: &Timestamp) -> usize {
        if b <= a {
            return 0;
        }
        if let Some(step) = self.fixed_step() {
            let Some(step) = step.num_nanoseconds().filter(|n| *n > 0) else {
                return 0;
            };
            let steps = b.nanos_since(a) / step as i128;
            return usize::try_from(steps).unwrap_or(usize::MAX);
        }
        if let Frequency::Custom { .. } = self {
            // Clamped month arithmetic does not compose, so walk it.
            let mut count = 0;
            let mut current = *a;
            while let Ok(next) = self.advance(&current) {
                if next > *b {
                    break;
                }
                count += 1;
                current = next;
            }
            return count;
        }

        let (Ok(first), Some(b)) = (self.advance(a), b.to_offset_of(a)) else {
            return 0;
        };
        if first > b {
            return 0;
        }
        // Every instant from `first` on shares `a`'s time of day.
        let time = a.naive().time();
        let last_date = if b.naive().time() >= time {
            b.date()
        } else {
            match b.date().pred_opt() {
                Some(date) => date,
                None => return 0,
            }
        };
        let first_date = first.date();
        let count = match self {
            Frequency::BusinessDaily => count_days(first_date, last_date, is_business_day),
            Frequency::Weekly(weekday) => {
                count_days(first_date, last_date, |date| date.weekday() == *weekday)
            }
            Frequency::Monthly(anchor) => {
                let candidate = month_anchor(b.date(), *anchor);
                let mut last = month_number(b.date());
                if candidate.is_none_or(|date| date.and_time(time) > b.naive()) {
                    last -= 1;
                }
                last - month_number(first_date) + 1
            }
            Frequency::Yearly(anchor) => {
                let year = b.date().year();
                let candidate = match anchor {
                    Anchor::Begin => NaiveDate::from_ymd_opt(year, 1, 1),
                    Anchor::End => NaiveDate::from_ymd_opt(year, 12, 31),
                };
                let mut last = year as i64;
                if candidate.is_none_or(|date| date.and_time(time) > b.naive()) {
                    last -= 1;
                }
                last - first_date.year() as i64 + 1
            }
            _ => 0,
        };
        usize::try_from(count).unwrap_or(0)
    }

    /// Finds a frequency under which every timestamp is the `advance` of its predecessor.
    ///
    /// Needs at least three strictly increasing timestamps; two points fit
    /// any tick frequency and say nothing.
    pub fn infer(timestamps: &[Timestamp]) -> Option<Frequency> {
        if timestamps.len() < 3 {
            return None;
        }
        let fits = |frequency: &Frequency| {
            timestamps
                .windows(2)
                .all(|pair| frequency.advance(&pair[0]).is_ok_and(|next| next == pair[1]))
        };

        let gap = timestamps[1].nanos_since(&timestamps[0]);
        let tick = tick_for_gap(gap);
        if let Some(frequency) = tick.filter(|f| fits(f)) {
            return Some(frequency);
        }

        [
            Frequency::BusinessDaily,
            Frequency::Weekly(timestamps[0].weekday()),
            Frequency::Monthly(Anchor::Begin),
            Frequency::Monthly(Anchor::End),
            Frequency::Yearly(Anchor::Begin),
            Frequency::Yearly(Anchor::End),
        ]
        .into_iter()
        .find(|frequency| frequency.is_on_offset(&timestamps[0]) && fits(frequency))
    }
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn tick_for_gap(gap: i128) -> Option<Frequency> {
    if gap <= 0 || gap % NANOS_PER_SECOND != 0 {
        return None;
    }
    let seconds = gap / NANOS_PER_SECOND;
    let named = match seconds {
        1 => Some(Frequency::Secondly),
        60 => Some(Frequency::Minutely),
        3_600 => Some(Frequency::Hourly),
        86_400 => Some(Frequency::Daily),
        _ => None,
    };
    if named.is_some() {
        return named;
    }
    let (unit, length) = [
        (TimeUnit::Week, 604_800),
        (TimeUnit::Day, 86_400),
        (TimeUnit::Hour, 3_600),
        (TimeUnit::Minute, 60),
        (TimeUnit::Second, 1),
    ]
    .into_iter()
    .find(|(_, length)| seconds % length == 0)?;
    let step = u32::try_from(seconds / length).ok()?;
    Some(Frequency::Custom { step, unit })
}

fn calendar_months(step: u32, unit: TimeUnit) -> Result<u32> {
    let months = match unit {
        TimeUnit::Month => Some(step),
        TimeUnit::Year => step.checked_mul(12),
        _ => None,
    };
    months
        .filter(|m| *m > 0)
        .ok_or_else(|| Error::InvalidSpecification(format!("invalid step {step} {unit:?}")))
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_month(date)?
        .checked_add_months(chrono::Months::new(1))?
        .pred_opt()
}

fn month_anchor(date: NaiveDate, anchor: Anchor) -> Option<NaiveDate> {
    match anchor {
        Anchor::Begin => first_of_month(date),
        Anchor::End => last_of_month(date),
    }
}

fn month_number(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Days in `[first, last]` accepted by `keep`.
fn count_days(first: NaiveDate, last: NaiveDate, keep: impl Fn(NaiveDate) -> bool) -> i64 {
    let span = (last - first).num_days() + 1;
    if span <= 0 {
        return 0;
    }
    let weeks = span / 7;
    let per_week = first.iter_days().take(7).filter(|d| keep(*d)).count() as i64;
    let tail = first
        .checked_add_signed(Duration::weeks(weeks))
        .map_or(0, |start| {
            start.iter_days().take((span % 7) as usize).filter(|d| keep(*d)).count() as i64
        });
    weeks * per_week + tail
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Secondly => write!(f, "S"),
            Frequency::Minutely => write!(f, "M"),
            Frequency::Hourly => write!(f, "H"),
            Frequency::Daily => write!(f, "D"),
            Frequency::BusinessDaily => write!(f, "B"),
            Frequency::Weekly(weekday) => write!(f, "W-{}", weekday.to_string().to_uppercase()),
            Frequency::Monthly(Anchor::Begin) => write!(f, "MB"),
            Frequency::Monthly(Anchor::End) => write!(f, "ME"),
            Frequency::Yearly(Anchor::Begin) => write!(f, "YB"),
            Frequency::Yearly(Anchor::End) => write!(f, "YE"),
            Frequency::Custom { step, unit } => write!(f, "{step}{}", unit.code()),
        }
    }
}

/// Parses frequency codes such as `D`, `2H`, `15M`, `B`, `W-MON`, `MB`, `ME`, `YB`, `YE`, `3MONTH`.
impl std::str::FromStr for Frequency {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let code = input.trim().to_uppercase();
        let digits = code.bytes().take_while(|b| b.is_ascii_digit()).count();
        let (count, name) = code.split_at(digits);
        let step: u32 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| Error::parse(input, "frequency multiplier out of range"))?
        };
        if step == 0 {
            return Err(Error::parse(input, "frequency multiplier must be positive"));
        }

        let tick = |unit: TimeUnit, single: Frequency| {
            if step == 1 {
                Ok(single)
            } else {
                Ok(Frequency::Custom { step, unit })
            }
        };
        let anchored = |frequency: Frequency| {
            if step == 1 {
                Ok(frequency)
            } else {
                Err(Error::parse(input, "anchored frequencies take no multiplier"))
            }
        };

        match name {
            "S" => tick(TimeUnit::Second, Frequency::Secondly),
            "M" | "T" | "MIN" => tick(TimeUnit::Minute, Frequency::Minutely),
            "H" => tick(TimeUnit::Hour, Frequency::Hourly),
            "D" => tick(TimeUnit::Day, Frequency::Daily),
            "W" => tick(TimeUnit::Week, Frequency::Weekly(Weekday::Sun)),
            "MONTH" => Ok(Frequency::Custom { step, unit: TimeUnit::Month }),
            "YEAR" => Ok(Frequency::Custom { step, unit: TimeUnit::Year }),
            "B" => anchored(Frequency::BusinessDaily),
            "MB" => anchored(Frequency::Monthly(Anchor::Begin)),
            "ME" => anchored(Frequency::Monthly(Anchor::End)),
            "YB" => anchored(Frequency::Yearly(Anchor::Begin)),
            "YE" => anchored(Frequency::Yearly(Anchor::End)),
            _ => match name.strip_prefix("W-") {
                Some(day) => {
                    let weekday = day
                        .parse::<Weekday>()
                        .map_err(|_| Error::parse(input, format!("unknown weekday '{day}'")))?;
                    anchored(Frequency::Weekly(weekday))
                }
                None => Err(Error::parse(input, "unknown frequency code")),
            },
        }
    }
}
