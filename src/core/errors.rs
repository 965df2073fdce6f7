use std::fmt;
use std::net::{AddrParseError, Ipv4Addr};
use std::num::ParseIntError;

/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

// Error type alias used throughout the crate.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/*--------------------------------------------------------------------------------------
  Record Error
--------------------------------------------------------------------------------------*/

/// Reason a dataset row was rejected while building a [RangeIndex](crate::RangeIndex).
///
/// Row errors never abort a build; they are counted and the row is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The row did not have exactly five fields.
    FieldCount(usize),

    /// The row could not be decoded (for example, invalid UTF-8).
    Malformed(String),

    /// A range bound was not an IPv4 dotted-quad address.
    Address(&'static str, AddrParseError),

    /// The AS number was not an unsigned 32-bit integer.
    AsNumber(ParseIntError),

    /// The range start address is greater than the range end address.
    InvertedRange { start: u32, end: u32 },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::FieldCount(count) => write!(f, "expected 5 fields, found {count}"),
            RecordError::Malformed(message) => write!(f, "malformed row: {message}"),
            RecordError::Address(field, error) => write!(f, "invalid {field}: {error}"),
            RecordError::AsNumber(error) => write!(f, "invalid AS number: {error}"),
            RecordError::InvertedRange { start, end } => {
                write!(
                    f,
                    "range start {} is greater than range end {}",
                    Ipv4Addr::from(*start),
                    Ipv4Addr::from(*end)
                )
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Address(_, error) => Some(error),
            RecordError::AsNumber(error) => Some(error),
            _ => None,
        }
    }
}

/*--------------------------------------------------------------------------------------
  Log Error Function
--------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) fn log_error(error: &Error) {
    log::error!("{}", error);
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
