use crate::core::errors::RecordError;
use std::net::Ipv4Addr;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Raw Row
-------------------------------------------------------------------------------------------------*/

/// The five text fields of one dataset row, in dataset order:
/// `range_start`, `range_end`, `AS_number`, `country_code`, `AS_description`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawRow {
    pub range_start: String,
    pub range_end: String,
    pub as_number: String,
    pub country_code: String,
    pub as_description: String,
}

impl RawRow {
    pub fn new(
        range_start: impl Into<String>,
        range_end: impl Into<String>,
        as_number: impl Into<String>,
        country_code: impl Into<String>,
        as_description: impl Into<String>,
    ) -> Self {
        Self {
            range_start: range_start.into(),
            range_end: range_end.into(),
            as_number: as_number.into(),
            country_code: country_code.into(),
            as_description: as_description.into(),
        }
    }
}

impl<S: Into<String>> From<(S, S, S, S, S)> for RawRow {
    fn from(value: (S, S, S, S, S)) -> Self {
        Self::new(value.0, value.1, value.2, value.3, value.4)
    }
}

/*-------------------------------------------------------------------------------------------------
  Range Record
-------------------------------------------------------------------------------------------------*/

/// An inclusive IPv4 address range and the AS metadata announced for it.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RangeRecord {
    /// First address of the range (inclusive), as a host-order integer.
    pub start: u32,

    /// Last address of the range (inclusive), as a host-order integer.
    pub end: u32,

    /// Announcing Autonomous System number; `0` for ranges that are not routed.
    pub as_number: u32,

    /// Country code of the AS; may be empty or `None` for ranges that are not routed.
    pub country_code: Arc<str>,

    /// AS description.
    pub description: Arc<str>,
}

impl RangeRecord {
    pub fn start_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.start)
    }

    pub fn end_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.end)
    }

    /// Number of addresses in the range, minus one.
    pub fn width(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, address: u32) -> bool {
        self.start <= address && address <= self.end
    }

    /// The upstream dataset marks unannounced space with AS `0`.
    pub fn is_routed(&self) -> bool {
        self.as_number != 0
    }
}

impl TryFrom<&RawRow> for RangeRecord {
    type Error = RecordError;

    fn try_from(row: &RawRow) -> Result<Self, Self::Error> {
        let start: Ipv4Addr = row
            .range_start
            .parse()
            .map_err(|error| RecordError::Address("range_start", error))?;
        let end: Ipv4Addr = row
            .range_end
            .parse()
            .map_err(|error| RecordError::Address("range_end", error))?;
        let as_number: u32 = row.as_number.parse().map_err(RecordError::AsNumber)?;

        let (start, end) = (u32::from(start), u32::from(end));
        if start > end {
            return Err(RecordError::InvertedRange { start, end });
        }

        Ok(RangeRecord {
            start,
            end,
            as_number,
            country_code: Arc::from(row.country_code.as_str()),
            description: Arc::from(row.as_description.as_str()),
        })
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
