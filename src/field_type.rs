use std::fmt;
use std::sync::Arc;

use crate::error::ParseError;
use crate::value::{Date, Time, Value};

/// Represents the supported field types of a scheme.
/// The set is closed: every [Value] holds exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Any UTF-8 string.
    Text,
    /// A finite 64-bit floating-point number.
    Float,
    /// A calendar date, `YYYY-MM-DD`.
    Date,
    /// A duration, `HH:SSSS` (hours, then seconds within the hour).
    Time,
}

impl FieldType {
    pub const ALL: [FieldType; 4] = [Self::Text, Self::Float, Self::Date, Self::Time];

    /// Returns the type declared by a scheme `"type"` member, if recognized.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "float" => Some(Self::Float),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            _ => None,
        }
    }

    /// The name used for this type in scheme JSON.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Float => "float",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    /// Parses the canonical string form of a value of this type.
    ///
    /// # Example
    /// ```
    /// use datastore::FieldType;
    ///
    /// let v = FieldType::Time.parse("23:124").unwrap();
    /// assert_eq!(v.to_string(), "23:0124");
    /// assert!(FieldType::Time.parse("10:9999").is_err());
    /// ```
    pub fn parse(&self, input: &str) -> Result<Value, ParseError> {
        match self {
            Self::Text => Ok(Value::Text(Arc::from(input))),
            Self::Float => parse_float(input),
            Self::Date => Date::parse(input)
                .map(Value::Date)
                .ok_or_else(|| ParseError::Date {
                    input: input.to_string(),
                }),
            Self::Time => parse_time(input),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_float(input: &str) -> Result<Value, ParseError> {
    match input.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Value::Float(v)),
        _ => Err(ParseError::Float {
            input: input.to_string(),
        }),
    }
}

fn parse_time(input: &str) -> Result<Value, ParseError> {
    let malformed = || ParseError::Time {
        input: input.to_string(),
    };

    let (hours, seconds) = input.split_once(':').ok_or_else(malformed)?;
    let hours = parse_digits(hours).ok_or_else(malformed)?;
    let seconds = parse_digits(seconds).ok_or_else(malformed)?;

    Time::from_parts(hours, seconds)
        .map(Value::Time)
        .ok_or_else(|| ParseError::TimeOutOfRange {
            input: input.to_string(),
        })
}

// u32::from_str accepts a leading '+', which is not part of the format
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
