use crate::cli::Resolution;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::*;
use ip2asn::{QueryResult, Result};

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Resolution Table
--------------------------------------------------------------------------------------*/

pub fn resolution_table(resolutions: &[Resolution]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Address")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("AS Number")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("Country Code")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("AS Description")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
    ]);

    for resolution in resolutions {
        let row = match &resolution.result {
            QueryResult::Found(as_info) => vec![
                Cell::new(&resolution.address).add_attribute(Attribute::Bold),
                Cell::new(as_info.as_number),
                Cell::new(&as_info.country_code),
                Cell::new(&as_info.description),
            ],
            other => vec![
                Cell::new(&resolution.address).add_attribute(Attribute::Bold),
                Cell::new(""),
                Cell::new(""),
                Cell::new(other.description()).fg(Color::Yellow),
            ],
        };
        table.add_row(row);
    }

    // Right-align the Address and AS Number columns
    for index in [0, 1] {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("{table}");

    // Print resolution-table summary
    let address_count = resolutions.len();
    let found_count = resolutions
        .iter()
        .filter(|resolution| resolution.result.is_found())
        .count();

    let mut summary_table = Table::new();
    summary_table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    summary_table.add_row(vec![Cell::new(address_count), Cell::new("Addresses")]);
    summary_table.add_row(vec![Cell::new(found_count), Cell::new("Resolved to an AS")]);

    if let Some(column) = summary_table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{summary_table}");
}

/*--------------------------------------------------------------------------------------
  JSON Lines
--------------------------------------------------------------------------------------*/

pub fn json_lines(resolutions: &[Resolution]) -> Result<()> {
    for resolution in resolutions {
        println!("{}", serde_json::to_string(&resolution.result)?);
    }
    Ok(())
}
