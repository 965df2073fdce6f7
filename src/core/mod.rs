/*-------------------------------------------------------------------------------------------------
  Core Modules
-------------------------------------------------------------------------------------------------*/

pub mod client;
pub mod errors;
pub mod json;
pub mod range_index;
pub mod range_record;
pub mod resolver;
pub mod shared_index;
pub mod tsv;
