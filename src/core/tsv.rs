use crate::core::errors::{Error, RecordError, Result};
use crate::core::range_index::{IndexBuilder, RangeIndex};
use crate::core::range_record::RawRow;
use flate2::bufread::GzDecoder;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  Read TSV Rows
-------------------------------------------------------------------------------------------------*/

/// A decoded dataset row, or the reason it was rejected.
pub type RowResult = std::result::Result<RawRow, RecordError>;

/// Iterate the rows of an `ip2asn-v4.tsv` formatted dataset.
///
/// Each item is `Ok(Ok(row))` for a well-formed five-field row, `Ok(Err(_))` for a row
/// that should be skipped, and `Err(_)` when the underlying reader fails.
pub fn read_rows<R: Read>(reader: R) -> impl Iterator<Item = Result<(u64, RowResult)>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(reader)
        .into_records()
        .enumerate()
        .map(|(i, record)| {
            let line = i as u64 + 1;
            match record {
                Ok(record) => Ok((line, raw_row(&record))),
                Err(error) if error.is_io_error() => Err(Error::from(error)),
                Err(error) => {
                    let line = error.position().map_or(line, |position| position.line());
                    Ok((line, Err(RecordError::Malformed(error.to_string()))))
                }
            }
        })
}

fn raw_row(record: &csv::StringRecord) -> RowResult {
    if record.len() != 5 {
        return Err(RecordError::FieldCount(record.len()));
    }

    Ok(RawRow::new(
        &record[0], &record[1], &record[2], &record[3], &record[4],
    ))
}

/*-------------------------------------------------------------------------------------------------
  Load Range Index
-------------------------------------------------------------------------------------------------*/

impl RangeIndex {
    /// Build a [RangeIndex] from an uncompressed `ip2asn-v4.tsv` dataset.
    ///
    /// Malformed rows are skipped and logged at `debug` level; read errors are returned.
    ///
    /// ```
    /// let tsv = "1.1.1.0\t1.1.1.255\t13335\tUS\tCLOUDFLARENET\n";
    /// let index = ip2asn::RangeIndex::from_tsv(tsv.as_bytes())?;
    /// assert_eq!(index.len(), 1);
    /// # Ok::<(), ip2asn::Error>(())
    /// ```
    pub fn from_tsv<R: Read>(reader: R) -> Result<RangeIndex> {
        let mut builder = IndexBuilder::new();

        for row in read_rows(reader) {
            let (line, row) = row?;
            let result = match row {
                Ok(row) => builder.push_row(&row),
                Err(error) => {
                    builder.skip_row();
                    Err(error)
                }
            };
            if let Err(error) = result {
                debug!("Skipping dataset row {line}: {error}");
            }
        }

        let index = builder.finish();
        info!(
            "Indexed {} range(s); skipped {} malformed row(s)",
            index.len(),
            index.skipped_rows()
        );

        Ok(index)
    }

    /// Build a [RangeIndex] from a gzip-compressed `ip2asn-v4.tsv.gz` dataset.
    pub fn from_gzip_tsv<R: BufRead>(reader: R) -> Result<RangeIndex> {
        Self::from_tsv(GzDecoder::new(reader))
    }
}

/// Build a [RangeIndex] from a dataset file; files with a `.gz` extension are decompressed.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<RangeIndex> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|error| Error::from(format!("failed to open {}: {error}", path.display())))?;

    info!("Loading dataset from: {:?}", path);
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("gz") => RangeIndex::from_gzip_tsv(BufReader::new(file)),
        _ => RangeIndex::from_tsv(file),
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
