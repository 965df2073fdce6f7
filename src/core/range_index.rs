use crate::core::errors::RecordError;
use crate::core::range_record::{RangeRecord, RawRow};
use crate::core::resolver::{self, QueryResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/*-------------------------------------------------------------------------------------------------
  Build
-------------------------------------------------------------------------------------------------*/

/// Build a [RangeIndex] from a sequence of raw dataset rows.
///
/// Rows that fail to parse are dropped and counted in [RangeIndex::skipped_rows]; use
/// [IndexBuilder] directly to observe each rejected row.
///
/// ```
/// let index = ip2asn::build([
///     ip2asn::RawRow::new("1.1.1.0", "1.1.1.255", "13335", "US", "CLOUDFLARENET"),
///     ip2asn::RawRow::new("1.1.1.0", "not-an-address", "13335", "US", "CLOUDFLARENET"),
/// ]);
///
/// assert_eq!(index.len(), 1);
/// assert_eq!(index.skipped_rows(), 1);
/// ```
pub fn build<I>(rows: I) -> RangeIndex
where
    I: IntoIterator,
    I::Item: Into<RawRow>,
{
    let mut builder = IndexBuilder::new();
    for row in rows {
        let _ = builder.push_row(&row.into());
    }
    builder.finish()
}

/*-------------------------------------------------------------------------------------------------
  Index Builder
-------------------------------------------------------------------------------------------------*/

/// Incremental [RangeIndex] builder. Records are accumulated in insertion order and the
/// interval tree is constructed once by [IndexBuilder::finish].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    records: Vec<RangeRecord>,
    skipped_rows: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and add a raw row. A rejected row is counted as skipped and its
    /// [RecordError] returned to the caller.
    pub fn push_row(&mut self, row: &RawRow) -> Result<(), RecordError> {
        RangeRecord::try_from(row)
            .map(|record| self.records.push(record))
            .inspect_err(|_| self.skipped_rows += 1)
    }

    /// Add an already parsed record. A record whose start is above its end is counted as
    /// skipped and rejected with [RecordError::InvertedRange].
    pub fn push_record(&mut self, record: RangeRecord) -> Result<(), RecordError> {
        if record.start > record.end {
            self.skipped_rows += 1;
            return Err(RecordError::InvertedRange {
                start: record.start,
                end: record.end,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Count a row that was rejected before it could be turned into a [RawRow].
    pub fn skip_row(&mut self) {
        self.skipped_rows += 1;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn finish(self) -> RangeIndex {
        let tree = IntervalTree::new(&self.records);
        RangeIndex {
            records: self.records,
            tree,
            skipped_rows: self.skipped_rows,
            built_at: Utc::now(),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Range Index
-------------------------------------------------------------------------------------------------*/

/// Immutable interval index over IPv4 address ranges.
///
/// Every inserted range is kept as a distinct entry; overlapping ranges are resolved at
/// query time by [RangeIndex::best_match].
#[derive(Clone, Debug)]
pub struct RangeIndex {
    records: Vec<RangeRecord>,
    tree: IntervalTree,
    skipped_rows: usize,
    built_at: DateTime<Utc>,
}

impl Default for RangeIndex {
    fn default() -> Self {
        IndexBuilder::new().finish()
    }
}

/*--------------------------------------------------------------------------------------
  Range Index Implementation
--------------------------------------------------------------------------------------*/

impl RangeIndex {
    /// Build a [RangeIndex] from raw rows; see [build].
    pub fn from_rows<I>(rows: I) -> RangeIndex
    where
        I: IntoIterator,
        I::Item: Into<RawRow>,
    {
        build(rows)
    }

    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    /// Number of indexed ranges.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of dataset rows dropped while building the index.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Time the index was built.
    pub fn built_at(&self) -> &DateTime<Utc> {
        &self.built_at
    }

    /// Indexed ranges in insertion order.
    pub fn records(&self) -> &[RangeRecord] {
        &self.records
    }

    /*-------------------------------------------------------------------------
      Queries
    -------------------------------------------------------------------------*/

    /// All ranges containing `address` (bounds inclusive), in insertion order.
    pub fn containing(&self, address: u32) -> Vec<&RangeRecord> {
        let mut positions = Vec::new();
        self.tree.query(&self.records, address, &mut positions);
        positions.sort_unstable();
        positions
            .into_iter()
            .map(|position| &self.records[position])
            .collect()
    }

    /// The single range selected for `address` when several ranges contain it.
    ///
    /// The narrowest range (smallest `end - start`) wins. Remaining ties go to the range
    /// with the lowest start address, then to the range inserted first.
    pub fn best_match(&self, address: u32) -> Option<&RangeRecord> {
        let mut positions = Vec::new();
        self.tree.query(&self.records, address, &mut positions);
        positions
            .into_iter()
            .min_by(|&a, &b| self.tie_break(a, b))
            .map(|position| &self.records[position])
    }

    /// Resolve an address string against this index; see [resolve](crate::resolve).
    pub fn resolve(&self, address: &str) -> QueryResult {
        resolver::resolve(address, self)
    }

    fn tie_break(&self, a: usize, b: usize) -> Ordering {
        let (ra, rb) = (&self.records[a], &self.records[b]);
        ra.width()
            .cmp(&rb.width())
            .then(ra.start.cmp(&rb.start))
            .then(a.cmp(&b))
    }
}

/*-------------------------------------------------------------------------------------------------
  Interval Tree
-------------------------------------------------------------------------------------------------*/

/*
    Centered interval tree stored in an arena. Each node owns the ranges that contain its
    center point, kept twice: ascending by start and descending by end. Ranges entirely
    below the center go to the left subtree and ranges entirely above it go to the right.

    The center of a node is the start address of the median range (by start), so at least
    one range lands on every node and each subtree holds at most half of its parent's
    ranges. Queries are O(log n + k).
*/

#[derive(Clone, Debug, Default)]
struct IntervalTree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

#[derive(Clone, Debug)]
struct Node {
    center: u32,
    by_start: Vec<usize>,
    by_end: Vec<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

impl IntervalTree {
    fn new(records: &[RangeRecord]) -> Self {
        let mut tree = IntervalTree::default();

        let mut positions: Vec<usize> = (0..records.len()).collect();
        positions.sort_by_key(|&position| (records[position].start, position));

        tree.root = tree.insert_node(records, positions);
        tree
    }

    /// Build the subtree for `positions` (sorted by start) and return its node id.
    fn insert_node(&mut self, records: &[RangeRecord], positions: Vec<usize>) -> Option<usize> {
        if positions.is_empty() {
            return None;
        }

        let center = records[positions[positions.len() / 2]].start;

        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut by_start = Vec::new();
        for position in positions {
            let record = &records[position];
            if record.end < center {
                left.push(position);
            } else if record.start > center {
                right.push(position);
            } else {
                by_start.push(position);
            }
        }

        let mut by_end = by_start.clone();
        by_end.sort_by(|&a, &b| records[b].end.cmp(&records[a].end).then(a.cmp(&b)));

        let id = self.nodes.len();
        self.nodes.push(Node {
            center,
            by_start,
            by_end,
            left: None,
            right: None,
        });

        let left = self.insert_node(records, left);
        let right = self.insert_node(records, right);
        self.nodes[id].left = left;
        self.nodes[id].right = right;

        Some(id)
    }

    /// Append the positions of every range containing `address` to `found`.
    fn query(&self, records: &[RangeRecord], address: u32, found: &mut Vec<usize>) {
        let mut next = self.root;
        while let Some(id) = next {
            let node = &self.nodes[id];
            match address.cmp(&node.center) {
                Ordering::Less => {
                    found.extend(
                        node.by_start
                            .iter()
                            .take_while(|&&position| records[position].start <= address),
                    );
                    next = node.left;
                }
                Ordering::Greater => {
                    found.extend(
                        node.by_end
                            .iter()
                            .take_while(|&&position| records[position].end >= address),
                    );
                    next = node.right;
                }
                Ordering::Equal => {
                    found.extend(node.by_start.iter());
                    next = None;
                }
            }
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::range_record::tests::cloudflare_row;
    use std::net::Ipv4Addr;
    use test_log::test;

    /*----------------------------------------------------------------------------------
      Test Helper Functions
    ----------------------------------------------------------------------------------*/

    pub(crate) fn ip(address: &str) -> u32 {
        u32::from(address.parse::<Ipv4Addr>().unwrap())
    }

    pub(crate) fn test_rows() -> Vec<RawRow> {
        vec![
            cloudflare_row(),
            RawRow::new("8.8.8.0", "8.8.8.255", "15169", "US", "GOOGLE"),
            RawRow::new("9.9.9.0", "9.9.9.255", "19281", "US", "QUAD9-AS-1"),
            RawRow::new("0.0.0.0", "0.255.255.255", "0", "None", "Not routed"),
        ]
    }

    /// Brute force reference for `containing`.
    fn linear_scan(index: &RangeIndex, address: u32) -> Vec<&RangeRecord> {
        index
            .records()
            .iter()
            .filter(|record| record.contains(address))
            .collect()
    }

    /*----------------------------------------------------------------------------------
      Build
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_build_empty() {
        let index = build(Vec::<RawRow>::new());
        assert!(index.is_empty());
        assert_eq!(index.skipped_rows(), 0);
        assert!(index.containing(ip("1.1.1.1")).is_empty());
        assert!(index.best_match(0).is_none());
        assert!(index.best_match(u32::MAX).is_none());
    }

    #[test]
    fn test_build_skips_malformed_rows() {
        let mut rows = test_rows();
        rows.insert(2, RawRow::new("8.8.8.0", "8.8.8.255", "GOOGLE", "US", "GOOGLE"));

        let index = build(rows);
        assert_eq!(index.len(), 4);
        assert_eq!(index.skipped_rows(), 1);
    }

    #[test]
    fn test_build_from_tuples() {
        let index = RangeIndex::from_rows([(
            "1.1.1.0",
            "1.1.1.255",
            "13335",
            "US",
            "CLOUDFLARENET",
        )]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_builder_reports_record_errors() {
        let mut builder = IndexBuilder::new();

        assert!(builder.push_row(&cloudflare_row()).is_ok());
        assert_eq!(
            builder.push_row(&RawRow::new("1.1.1.9", "1.1.1.0", "1", "US", "X")),
            Err(RecordError::InvertedRange {
                start: ip("1.1.1.9"),
                end: ip("1.1.1.0"),
            })
        );
        builder.skip_row();

        assert_eq!(builder.len(), 1);
        assert_eq!(builder.skipped_rows(), 2);

        let index = builder.finish();
        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped_rows(), 2);
    }

    #[test]
    fn test_builder_rejects_inverted_record() {
        let mut builder = IndexBuilder::new();
        let record = RangeRecord::try_from(&cloudflare_row()).unwrap();
        let inverted = RangeRecord {
            start: 5,
            end: 1,
            ..record.clone()
        };

        assert_eq!(
            builder.push_record(inverted),
            Err(RecordError::InvertedRange { start: 5, end: 1 })
        );
        assert!(builder.push_record(record).is_ok());
        assert_eq!(builder.skipped_rows(), 1);

        let index = builder.finish();
        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped_rows(), 1);
        assert!(index.best_match(ip("1.1.1.1")).is_some());
        assert!(index.best_match(3).is_none());
    }

    #[test]
    fn test_build_keeps_duplicate_ranges() {
        let index = build([cloudflare_row(), cloudflare_row()]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.containing(ip("1.1.1.1")).len(), 2);
    }

    /*----------------------------------------------------------------------------------
      Containment Queries
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_containing_inclusive_bounds() {
        let index = build(test_rows());

        for address in ["1.1.1.0", "1.1.1.1", "1.1.1.255"] {
            let found = index.containing(ip(address));
            assert_eq!(found.len(), 1, "{address}");
            assert_eq!(found[0].as_number, 13335);
        }

        assert!(index.containing(ip("1.1.0.255")).is_empty());
        assert!(index.containing(ip("1.1.2.0")).is_empty());
    }

    #[test]
    fn test_containing_address_space_edges() {
        let index = build([
            RawRow::new("0.0.0.0", "0.0.0.0", "1", "", "FIRST"),
            RawRow::new("255.255.255.255", "255.255.255.255", "2", "", "LAST"),
            RawRow::new("0.0.0.0", "255.255.255.255", "3", "", "EVERYTHING"),
        ]);

        assert_eq!(index.containing(0).len(), 2);
        assert_eq!(index.containing(u32::MAX).len(), 2);
        assert_eq!(index.containing(ip("128.0.0.0")).len(), 1);
        assert_eq!(index.best_match(0).unwrap().as_number, 1);
        assert_eq!(index.best_match(u32::MAX).unwrap().as_number, 2);
        assert_eq!(index.best_match(ip("128.0.0.0")).unwrap().as_number, 3);
    }

    #[test]
    fn test_containing_reports_all_overlaps() {
        let index = build([
            RawRow::new("10.0.0.0", "10.255.255.255", "1", "AA", "WIDE"),
            RawRow::new("10.1.0.0", "10.1.255.255", "2", "BB", "MIDDLE"),
            RawRow::new("10.1.1.0", "10.1.1.255", "3", "CC", "NARROW"),
            RawRow::new("10.2.0.0", "10.2.255.255", "4", "DD", "SIBLING"),
        ]);

        let as_numbers = |address: &str| -> Vec<u32> {
            index
                .containing(ip(address))
                .iter()
                .map(|record| record.as_number)
                .collect()
        };

        assert_eq!(as_numbers("10.1.1.1"), vec![1, 2, 3]);
        assert_eq!(as_numbers("10.1.2.1"), vec![1, 2]);
        assert_eq!(as_numbers("10.2.0.0"), vec![1, 4]);
        assert_eq!(as_numbers("10.3.0.0"), vec![1]);
        assert_eq!(as_numbers("11.0.0.0"), Vec::<u32>::new());
    }

    #[test]
    fn test_containing_matches_linear_scan() {
        // Deterministic pseudo-random ranges with heavy overlap.
        let mut state: u32 = 0x9e37_79b9;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        let rows: Vec<RawRow> = (0..500)
            .map(|i| {
                let start = next() >> 8;
                let end = start.saturating_add(next() >> 16);
                RawRow::new(
                    Ipv4Addr::from(start).to_string(),
                    Ipv4Addr::from(end).to_string(),
                    i.to_string(),
                    "ZZ".to_string(),
                    format!("AS-{i}"),
                )
            })
            .collect();
        let index = build(rows);
        assert_eq!(index.len(), 500);

        let mut probes: Vec<u32> = index
            .records()
            .iter()
            .flat_map(|record| {
                [
                    record.start,
                    record.end,
                    record.start.saturating_sub(1),
                    record.end.saturating_add(1),
                ]
            })
            .collect();
        probes.extend((0..500).map(|_| next() >> 8));

        for address in probes {
            assert_eq!(
                index.containing(address),
                linear_scan(&index, address),
                "address {}",
                Ipv4Addr::from(address)
            );
        }
    }

    /*----------------------------------------------------------------------------------
      Tie-Break
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_best_match_prefers_narrowest_range() {
        let index = build([
            RawRow::new("10.0.0.0", "10.255.255.255", "1", "AA", "WIDE"),
            RawRow::new("10.1.1.0", "10.1.1.255", "3", "CC", "NARROW"),
            RawRow::new("10.1.0.0", "10.1.255.255", "2", "BB", "MIDDLE"),
        ]);

        assert_eq!(index.best_match(ip("10.1.1.1")).unwrap().as_number, 3);
        assert_eq!(index.best_match(ip("10.1.2.1")).unwrap().as_number, 2);
        assert_eq!(index.best_match(ip("10.9.9.9")).unwrap().as_number, 1);
    }

    #[test]
    fn test_best_match_equal_width_prefers_lowest_start() {
        let index = build([
            RawRow::new("20.0.0.128", "20.0.1.127", "2", "BB", "HIGHER"),
            RawRow::new("20.0.0.0", "20.0.0.255", "1", "AA", "LOWER"),
        ]);

        assert_eq!(index.best_match(ip("20.0.0.200")).unwrap().as_number, 1);
    }

    #[test]
    fn test_best_match_identical_ranges_prefers_first_inserted() {
        let index = build([
            RawRow::new("30.0.0.0", "30.0.0.255", "1", "AA", "FIRST"),
            RawRow::new("30.0.0.0", "30.0.0.255", "2", "BB", "SECOND"),
        ]);

        assert_eq!(index.best_match(ip("30.0.0.1")).unwrap().as_number, 1);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let rows = [
            RawRow::new("40.0.0.0", "40.0.255.255", "1", "AA", "A"),
            RawRow::new("40.0.0.0", "40.0.255.255", "2", "BB", "B"),
            RawRow::new("40.0.1.0", "40.0.1.255", "3", "CC", "C"),
        ];
        let first = build(rows.clone());
        let second = build(rows);

        for address in ["40.0.0.1", "40.0.1.1", "40.0.2.1", "41.0.0.0"] {
            assert_eq!(first.best_match(ip(address)), second.best_match(ip(address)));
        }
    }
}
