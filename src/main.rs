mod cli;

use clap::Parser;
use log::error;
use std::process::ExitCode;

/*-------------------------------------------------------------------------------------------------
  Main CLI Function
-------------------------------------------------------------------------------------------------*/

fn main() -> ExitCode {
    let args = cli::Args::parse();

    // Initialize logging
    let level = args.verbose.log_level_filter();
    stderrlog::new()
        .module(module_path!())
        .quiet(level == log::LevelFilter::Off)
        .verbosity((level as usize).saturating_sub(1))
        .init()
        .ok();

    // Load the range index
    let index = match cli::load_index(&args) {
        Ok(index) => index,
        Err(error) => {
            error!("Failed to load the IP to ASN dataset: {error}");
            return ExitCode::from(2);
        }
    };
    cli::log::range_index(&index);

    // Resolve addresses
    let resolutions = cli::resolve_addresses(&args, &index);
    cli::log::resolutions(&resolutions);

    // Output
    match args.output {
        cli::OutputFormat::Table => cli::output::resolution_table(&resolutions),
        cli::OutputFormat::Json => {
            if let Err(error) = cli::output::json_lines(&resolutions) {
                error!("Failed to write JSON output: {error}");
                return ExitCode::from(2);
            }
        }
    }

    // Save results to CSV file
    if let Some(csv_file) = &args.csv_file {
        if let Err(error) = cli::csv::save(&resolutions, csv_file) {
            error!("Failed to save results to `{:?}`: {error}", csv_file);
            return ExitCode::from(2);
        }
    }

    // Exit with an error when an address was invalid or did not resolve
    let unresolved = resolutions.iter().any(|resolution| {
        matches!(
            resolution.result,
            ip2asn::QueryResult::InvalidAddress | ip2asn::QueryResult::NoMatch
        )
    });
    if unresolved {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
