//! Species identity and occurrence records.
use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};
use crate::geo::{BoundingBox, Coord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub taxon_key: u64,
    pub scientific_name: String,
    pub canonical_name: String,
}

/// Lookup of species names and their recorded locations.
pub trait OccurrenceSource {
    fn species_info(&self, name: &str) -> Result<SpeciesInfo>;

    /// Every occurrence of `taxon_key` inside `bbox`, as (lon, lat).
    fn occurrences(&self, taxon_key: u64, bbox: &BoundingBox) -> Result<Vec<Coord>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub species: String,
    pub taxon_key: u64,
    pub lon: f64,
    pub lat: f64,
}

/// Occurrence records held in memory, typically read from a TSV export.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceTable {
    records: Vec<OccurrenceRecord>,
}

impl OccurrenceTable {
    pub fn new(records: Vec<OccurrenceRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[OccurrenceRecord] {
        &self.records
    }
}

impl OccurrenceSource for OccurrenceTable {
    fn species_info(&self, name: &str) -> Result<SpeciesInfo> {
        let wanted = name.trim();
        let record = self
            .records
            .iter()
            .find(|r| r.species.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FinderError::SpeciesNotFound(name.to_string()))?;
        Ok(SpeciesInfo {
            taxon_key: record.taxon_key,
            scientific_name: record.species.clone(),
            canonical_name: record.species.clone(),
        })
    }

    fn occurrences(&self, taxon_key: u64, bbox: &BoundingBox) -> Result<Vec<Coord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.taxon_key == taxon_key)
            .map(|r| Coord::new(r.lon, r.lat))
            .filter(|c| bbox.contains(c))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OccurrenceTable {
        OccurrenceTable::new(vec![
            OccurrenceRecord {
                species: "Quercus robur".into(),
                taxon_key: 2878688,
                lon: 0.1,
                lat: 52.2,
            },
            OccurrenceRecord {
                species: "Quercus robur".into(),
                taxon_key: 2878688,
                lon: 5.0,
                lat: 52.2,
            },
            OccurrenceRecord {
                species: "Fraxinus excelsior".into(),
                taxon_key: 3172358,
                lon: 0.1,
                lat: 52.2,
            },
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let info = table().species_info("quercus ROBUR").unwrap();
        assert_eq!(info.taxon_key, 2878688);
        assert_eq!(info.canonical_name, "Quercus robur");
        assert!(matches!(
            table().species_info("Ulmus minor"),
            Err(FinderError::SpeciesNotFound(_))
        ));
    }

    #[test]
    fn occurrences_filter_by_taxon_and_bbox() {
        let bbox = BoundingBox::new(0.03, 52.13, 0.22, 52.29);
        let occ = table().occurrences(2878688, &bbox).unwrap();
        assert_eq!(occ, vec![Coord::new(0.1, 52.2)]);
    }
}
