use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::models::ResultRecord;

/// Write one CSV row per record, in the order given.
pub fn write_results<W: Write>(writer: W, records: &[ResultRecord]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_results_to_path(path: &Path, records: &[ResultRecord]) -> csv::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_results(std::io::BufWriter::new(file), records)?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
