use ip2asn::{QueryResult, Result, SharedIndex};

fn main() -> Result<()> {
    // Get the IP to ASN dataset and build the index
    let shared = SharedIndex::new(ip2asn::get_index()?);

    // Resolve a few addresses
    for address in ["1.1.1.1", "8.8.8.8", "10.5.5.5", "1.1.1.999"] {
        match shared.resolve(address) {
            QueryResult::Found(as_info) => println!(
                "{address}: AS{} {} ({})",
                as_info.as_number, as_info.description, as_info.country_code
            ),
            other => println!("{address}: {other}"),
        }
    }

    // Refresh the index; in-flight lookups keep using the previous snapshot
    let snapshot = shared.load();
    shared.refresh(&ip2asn::Client::new())?;
    println!(
        "Previous index: {} ranges; current index: {} ranges",
        snapshot.len(),
        shared.load().len()
    );

    // JSON result shape
    println!("{}", serde_json::to_string(&shared.resolve("9.9.9.9"))?);

    Ok(())
}
