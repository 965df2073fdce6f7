use crate::cli::Resolution;
use ip2asn::Result;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Save Resolutions to CSV File
-------------------------------------------------------------------------------------------------*/

pub fn save(resolutions: &[Resolution], path: &PathBuf) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.serialize([
        "Address",
        "AS Number",
        "Country Code",
        "AS Description",
    ])?;

    // Write resolution records
    for resolution in resolutions {
        let as_info = resolution.result.as_info();
        let record = (
            &resolution.address,
            as_info.map(|as_info| as_info.as_number),
            as_info.map(|as_info| as_info.country_code.as_str()),
            resolution.result.description(),
        );
        writer.serialize(record)?;
    }

    writer.flush()?;

    Ok(())
}
