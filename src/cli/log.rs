use crate::cli::Resolution;
use ip2asn::{QueryResult, RangeIndex};
use log::{info, warn};

/*-------------------------------------------------------------------------------------------------
  Logging Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Range Index
--------------------------------------------------------------------------------------*/

pub fn range_index(index: &RangeIndex) {
    info!(
        "Loaded {} range(s) built at {}",
        index.len(),
        index.built_at()
    );

    let skipped_rows = index.skipped_rows();
    if skipped_rows > 0 {
        warn!("Skipped {skipped_rows} malformed dataset row(s)");
    }
}

/*--------------------------------------------------------------------------------------
  Resolutions
--------------------------------------------------------------------------------------*/

pub fn resolutions(resolutions: &[Resolution]) {
    let count = resolutions.len();
    let count_found = resolutions
        .iter()
        .filter(|resolution| resolution.result.is_found())
        .count();
    info!("Resolved {count_found} of {count} address(es) to an AS");

    for resolution in resolutions {
        match &resolution.result {
            QueryResult::InvalidAddress => warn!("Invalid IPv4 address: {:?}", resolution.address),
            QueryResult::NoMatch => warn!("No AS found for: {}", resolution.address),
            QueryResult::Found(as_info) if as_info.as_number == 0 => {
                warn!("{} is in a range that is not routed", resolution.address)
            }
            _ => {}
        }
    }
}
