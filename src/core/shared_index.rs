use crate::core::client::Client;
use crate::core::errors::Result;
use crate::core::range_index::RangeIndex;
use crate::core::resolver::{self, QueryResult};
use arc_swap::ArcSwap;
use log::info;
use std::sync::Arc;

/*-------------------------------------------------------------------------------------------------
  Shared Index
-------------------------------------------------------------------------------------------------*/

/// Process-wide handle to the active [RangeIndex].
///
/// Readers take a snapshot with [SharedIndex::load] and never observe a partially built
/// index. A refreshed index is built off to the side and published with a single atomic
/// swap; queries already holding the previous snapshot finish against it.
///
/// ```
/// use ip2asn::{QueryResult, RawRow, SharedIndex};
///
/// let shared = SharedIndex::empty();
/// assert_eq!(shared.resolve("1.1.1.1"), QueryResult::NoMatch);
///
/// let row = RawRow::new("1.1.1.0", "1.1.1.255", "13335", "US", "CLOUDFLARENET");
/// shared.replace(ip2asn::build([row]));
/// assert!(shared.resolve("1.1.1.1").is_found());
/// ```
#[derive(Debug)]
pub struct SharedIndex {
    active: ArcSwap<RangeIndex>,
}

impl SharedIndex {
    pub fn new(index: RangeIndex) -> Self {
        Self {
            active: ArcSwap::from_pointee(index),
        }
    }

    /// A handle to an empty index; every lookup returns [QueryResult::NoMatch] until an
    /// index is published.
    pub fn empty() -> Self {
        Self::new(RangeIndex::default())
    }

    /// Snapshot of the active index.
    pub fn load(&self) -> Arc<RangeIndex> {
        self.active.load_full()
    }

    /// Publish a new index, returning the one it replaced.
    pub fn replace(&self, index: RangeIndex) -> Arc<RangeIndex> {
        self.active.swap(Arc::new(index))
    }

    /// Resolve an address against the active index.
    pub fn resolve(&self, address: &str) -> QueryResult {
        resolver::resolve(address, &self.active.load())
    }

    /// Retrieve the dataset with `client`, build a new index, and publish it. The active
    /// index is left in place if retrieval or the build fails.
    pub fn refresh(&self, client: &Client) -> Result<()> {
        let index = client.get_index()?;
        info!(
            "Publishing refreshed index: {} range(s) built at {}",
            index.len(),
            index.built_at()
        );
        self.replace(index);
        Ok(())
    }
}

impl Default for SharedIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<RangeIndex> for SharedIndex {
    fn from(index: RangeIndex) -> Self {
        Self::new(index)
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
