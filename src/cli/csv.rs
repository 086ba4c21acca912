use cloudipranges::{CloudRangeRegistry, ProviderId, Result};
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  Save Cloud IP Ranges to CSV File
-------------------------------------------------------------------------------------------------*/

pub fn save(registry: &CloudRangeRegistry, providers: &[ProviderId], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.serialize(["Provider", "IP Prefix"])?;

    // Write prefix records
    for provider in providers {
        let Some(snapshot) = registry.snapshot(*provider) else {
            continue;
        };
        for prefix in snapshot.prefixes() {
            writer.serialize((provider.as_str(), prefix.to_string()))?;
        }
    }

    writer.flush()?;

    Ok(())
}
