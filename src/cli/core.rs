use crate::cli;
use ip2asn::{QueryResult, RangeIndex, Result};

/*-------------------------------------------------------------------------------------------------
  Core functions
-------------------------------------------------------------------------------------------------*/

/// An address as entered on the command line and the result of resolving it.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub address: String,
    pub result: QueryResult,
}

/*--------------------------------------------------------------------------------------
  Load the Range Index from the CLI arguments
--------------------------------------------------------------------------------------*/

pub fn load_index(args: &cli::Args) -> Result<RangeIndex> {
    match &args.dataset_file {
        Some(path) => ip2asn::load_file(path),
        None => ip2asn::get_index(),
    }
}

/*--------------------------------------------------------------------------------------
  Resolve the addresses from the CLI arguments
--------------------------------------------------------------------------------------*/

pub fn resolve_addresses(args: &cli::Args, index: &RangeIndex) -> Vec<Resolution> {
    args.addresses
        .iter()
        .map(|address| address.trim())
        .map(|address| Resolution {
            address: address.to_string(),
            result: index.resolve(address),
        })
        .collect()
}
