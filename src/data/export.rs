use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::AdmissionRecord;

/// Name offered for the downloadable copy of the table.
pub const DEFAULT_EXPORT_NAME: &str = "dados_sus_2024.csv";

/// Serialize the full record set as comma-separated UTF-8 with the upstream header.
pub fn write_csv<W: Write>(writer: W, records: &[AdmissionRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (row, rec) in records.iter().enumerate() {
        csv_writer
            .serialize(rec)
            .with_context(|| format!("writing row {row} ({})", rec.diagnosis_code))?;
    }
    csv_writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write the record set to `path`, replacing any existing file.
pub fn export_csv(path: &Path, records: &[AdmissionRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(file, records)?;
    log::info!("Exported {} rows to {}", records.len(), path.display());
    Ok(())
}
