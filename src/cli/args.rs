use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

#[derive(Parser, Debug)]
#[command(author, version, about="Resolve IPv4 addresses to the Autonomous Systems that announce them.", long_about = None)]
pub struct Args {
    /// Resolve against a local ip2asn-v4 dataset (.tsv or .tsv.gz) instead of the cached download
    #[arg(short = 'f', long = "file")]
    pub dataset_file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Save the results to a CSV file
    #[arg(long = "csv")]
    pub csv_file: Option<PathBuf>,

    /// Logging verbosity
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// IPv4 addresses to resolve
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

/*--------------------------------------------------------------------------------------
  Output Format
--------------------------------------------------------------------------------------*/

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Table of addresses and their AS details
    #[default]
    Table,

    /// One JSON object per address
    Json,
}
