use crate::core::range_index::RangeIndex;
use crate::core::range_record::RangeRecord;
use ipnetwork::Ipv4Network;
use lazy_static::lazy_static;
use std::fmt;
use std::net::Ipv4Addr;

/*-------------------------------------------------------------------------------------------------
  Private Networks
-------------------------------------------------------------------------------------------------*/

lazy_static! {
    /// Special-purpose IPv4 ranges that are never resolved against the index.
    ///
    /// This is the IANA "not globally reachable" set: RFC 1918 private space plus
    /// this-network, loopback, link-local, protocol assignments, documentation,
    /// benchmarking, reserved, and limited broadcast. Shared address space
    /// (100.64.0.0/10) is excluded.
    pub static ref PRIVATE_NETWORKS: Vec<Ipv4Network> = [
        "0.0.0.0/8",
        "10.0.0.0/8",
        "127.0.0.0/8",
        "169.254.0.0/16",
        "172.16.0.0/12",
        "192.0.0.0/29",
        "192.0.0.170/31",
        "192.0.2.0/24",
        "192.168.0.0/16",
        "198.18.0.0/15",
        "198.51.100.0/24",
        "203.0.113.0/24",
        "240.0.0.0/4",
        "255.255.255.255/32",
    ]
    .iter()
    .filter_map(|network| network.parse().ok())
    .collect();
}

/// Returns `true` when `address` falls in one of the [PRIVATE_NETWORKS].
pub fn is_private(address: Ipv4Addr) -> bool {
    PRIVATE_NETWORKS
        .iter()
        .any(|network| network.contains(address))
}

/*-------------------------------------------------------------------------------------------------
  Query Result
-------------------------------------------------------------------------------------------------*/

/// AS metadata copied out of the matching [RangeRecord].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AsInfo {
    pub as_number: u32,
    pub country_code: String,
    pub description: String,
}

impl From<&RangeRecord> for AsInfo {
    fn from(record: &RangeRecord) -> Self {
        Self {
            as_number: record.as_number,
            country_code: record.country_code.to_string(),
            description: record.description.to_string(),
        }
    }
}

/// Outcome of resolving one address.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum QueryResult {
    /// The address is in a private or otherwise non-global range.
    PrivateAddress,

    /// The input was not an IPv4 dotted-quad address.
    InvalidAddress,

    /// No indexed range contains the address.
    NoMatch,

    /// The selected range's AS metadata.
    Found(AsInfo),
}

impl QueryResult {
    pub fn is_found(&self) -> bool {
        matches!(self, QueryResult::Found(_))
    }

    pub fn as_info(&self) -> Option<&AsInfo> {
        match self {
            QueryResult::Found(as_info) => Some(as_info),
            _ => None,
        }
    }

    /// The AS description, or the placeholder text reported for non-`Found` results.
    pub fn description(&self) -> &str {
        match self {
            QueryResult::PrivateAddress => "Private Network",
            QueryResult::InvalidAddress => "Invalid IP",
            QueryResult::NoMatch => "ASN Unknown",
            QueryResult::Found(as_info) => &as_info.description,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Found(as_info) => write!(
                f,
                "AS{} {} ({})",
                as_info.as_number, as_info.description, as_info.country_code
            ),
            _ => f.write_str(self.description()),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Resolve
-------------------------------------------------------------------------------------------------*/

/// Resolve an IPv4 address string to the AS announcing it.
///
/// Malformed input is reported as [QueryResult::InvalidAddress] before any other check;
/// private addresses are reported as [QueryResult::PrivateAddress] even if an indexed
/// range covers them. Overlapping ranges are resolved by [RangeIndex::best_match].
///
/// ```
/// use ip2asn::{QueryResult, RawRow};
///
/// let index = ip2asn::build([RawRow::new("1.1.1.0", "1.1.1.255", "13335", "US", "CLOUDFLARENET")]);
///
/// let found = ip2asn::resolve("1.1.1.1", &index);
/// assert_eq!(found.as_info().unwrap().as_number, 13335);
///
/// assert_eq!(ip2asn::resolve("1.1.2.1", &index), QueryResult::NoMatch);
/// assert_eq!(ip2asn::resolve("10.5.5.5", &index), QueryResult::PrivateAddress);
/// assert_eq!(ip2asn::resolve("1.1.1.999", &index), QueryResult::InvalidAddress);
/// ```
pub fn resolve(address: &str, index: &RangeIndex) -> QueryResult {
    let Ok(address) = address.parse::<Ipv4Addr>() else {
        return QueryResult::InvalidAddress;
    };

    if is_private(address) {
        return QueryResult::PrivateAddress;
    }

    index
        .best_match(u32::from(address))
        .map_or(QueryResult::NoMatch, |record| {
            QueryResult::Found(AsInfo::from(record))
        })
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
