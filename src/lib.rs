//! Resolve IPv4 addresses to the Autonomous System (AS) that announces them.
//!
//! `ip2asn` builds an interval index from the [IPtoASN](https://iptoasn.com/) `ip2asn-v4`
//! dataset and answers point lookups against it. Every address resolves to one of four
//! [QueryResult] variants: a matching AS, a private address, an invalid address, or no
//! match.
//!
//! ```
//! use ip2asn::{QueryResult, RawRow};
//!
//! let index = ip2asn::build([
//!     RawRow::new("1.1.1.0", "1.1.1.255", "13335", "US", "CLOUDFLARENET"),
//!     RawRow::new("8.8.8.0", "8.8.8.255", "15169", "US", "GOOGLE"),
//! ]);
//!
//! match index.resolve("8.8.8.8") {
//!     QueryResult::Found(as_info) => assert_eq!(as_info.as_number, 15169),
//!     other => panic!("unexpected result: {other}"),
//! }
//! ```
//!
//! Use [get_index] (or a configured [Client]) to download, cache, and index the full dataset,
//! and [SharedIndex] to publish refreshed indexes to concurrent readers.

mod core;

/*-------------------------------------------------------------------------------------------------
  Library Interface
-------------------------------------------------------------------------------------------------*/

pub use crate::core::client::{get_index, Client, ClientBuilder};
pub use crate::core::errors::{Error, RecordError, Result};
pub use crate::core::json::JsonQueryResult;
pub use crate::core::range_index::{build, IndexBuilder, RangeIndex};
pub use crate::core::range_record::{RangeRecord, RawRow};
pub use crate::core::resolver::{is_private, resolve, AsInfo, QueryResult, PRIVATE_NETWORKS};
pub use crate::core::shared_index::SharedIndex;
pub use crate::core::tsv::{load_file, read_rows, RowResult};
