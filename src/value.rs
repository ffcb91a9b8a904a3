use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::field_type::FieldType;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar date (`YYYY-MM-DD`).
///
/// Dates order by their ordinal, the number of days since 0001-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Builds a date from its calendar parts, `None` if the day does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Builds a date from its ordinal, see [Date::ordinal].
    pub fn from_ordinal(days: i32) -> Option<Self> {
        NaiveDate::from_num_days_from_ce_opt(days).map(Self)
    }

    /// Days since 0001-01-01 (which is day 1).
    pub fn ordinal(&self) -> i32 {
        self.0.num_days_from_ce()
    }

    /// Strict inverse of `Display`: `YYYY-MM-DD` with a four digit year, or a
    /// signed year (`+YYYYY`, `-YYYY`) outside of 0000..=9999.
    pub(crate) fn parse(input: &str) -> Option<Self> {
        if !input.is_ascii() || input.len() < 10 {
            return None;
        }
        let (year, month_day) = input.split_at(input.len() - 6);
        let month_day = month_day.as_bytes();
        if month_day[0] != b'-' || month_day[3] != b'-' {
            return None;
        }

        let year = match year.as_bytes()[0] {
            b'+' if year.len() > 5 => parse_digits(&year[1..])?,
            b'-' if year.len() > 4 => -parse_digits(&year[1..])?,
            _ if year.len() == 4 => parse_digits(year)?,
            _ => return None,
        };
        let month = parse_digits(&input[input.len() - 5..input.len() - 3])?;
        let day = parse_digits(&input[input.len() - 2..])?;

        NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?).map(Self)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

fn parse_digits(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// A duration in `hours:seconds` form, packed as `hours * 3600 + seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u32);

impl Time {
    pub const SECONDS_PER_HOUR: u32 = 3600;

    /// Returns `None` when `seconds >= 3600` or the packed value overflows.
    pub fn from_parts(hours: u32, seconds: u32) -> Option<Self> {
        if seconds >= Self::SECONDS_PER_HOUR {
            return None;
        }
        hours
            .checked_mul(Self::SECONDS_PER_HOUR)
            .and_then(|h| h.checked_add(seconds))
            .map(Self)
    }

    pub fn hours(&self) -> u32 {
        self.0 / Self::SECONDS_PER_HOUR
    }

    pub fn seconds(&self) -> u32 {
        self.0 % Self::SECONDS_PER_HOUR
    }

    pub fn total_seconds(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:04}", self.hours(), self.seconds())
    }
}

/// Represents a single data value stored in the datastore.
///
/// There is no null variant: a missing value is an absent slot
/// (`Option<Value>`) in a [crate::Row].
#[derive(Debug, Clone)]
pub enum Value {
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    Text(Arc<str>),
    /// A finite 64-bit floating-point value.
    Float(f64),
    /// A calendar date.
    Date(Date),
    /// An `hours:seconds` duration.
    Time(Time),
}

impl Value {
    /// Returns the [FieldType] corresponding to this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Float(_) => FieldType::Float,
            Self::Date(_) => FieldType::Date,
            Self::Time(_) => FieldType::Time,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<Time> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Date> for Value {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<Time> for Value {
    fn from(t: Time) -> Self {
        Self::Time(t)
    }
}

/// Canonical string form, the inverse of [FieldType::parse].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Float(v) => write!(f, "{v}"),
            Self::Date(d) => fmt::Display::fmt(d, f),
            Self::Time(t) => fmt::Display::fmt(t, f),
        }
    }
}

/// Values of different types are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            _ => false,
        }
    }
}

// Floats are finite, see FieldType::parse.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Text(s) => s.hash(state),
            // 0.0 and -0.0 are equal, so they must hash alike
            Self::Float(v) => {
                let bits = if *v == 0.0 { 0 } else { v.to_bits() };
                bits.hash(state);
            }
            Self::Date(d) => d.hash(state),
            Self::Time(t) => t.hash(state),
        }
    }
}

/// Ordering is only defined between values of the same type.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
