//! Occurrence table TSV reader (`species`, `taxon_key`, `lon`, `lat`).
use std::path::Path;

use anyhow::{Context, Result};

use crate::occurrence::{OccurrenceRecord, OccurrenceTable};

pub fn read_occurrence_tsv<P: AsRef<Path>>(path: P) -> Result<OccurrenceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open occurrence file: {}", path.as_ref().display()))?;

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<OccurrenceRecord>().enumerate() {
        let record = result.with_context(|| {
            format!(
                "Invalid occurrence at row {} of {}",
                line + 1,
                path.as_ref().display()
            )
        })?;
        records.push(record);
    }

    log::debug!(
        "Loaded {} occurrence records from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(OccurrenceTable::new(records))
}
