//! Writers for prediction outputs and validation records.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::geo::{BoundingBox, GeoTransform};
use crate::geojson::occurrences_geojson;
use crate::pipeline::PredictionResult;

/// Sidecar describing how `probability.tsv` maps onto the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMetadata {
    pub species: String,
    pub taxon_key: u64,
    pub method: String,
    pub method_description: String,
    pub height: usize,
    pub width: usize,
    pub transform: GeoTransform,
    pub bbox: BoundingBox,
    pub n_occurrences: usize,
    pub n_negatives: Option<usize>,
}

impl From<&PredictionResult> for GridMetadata {
    fn from(r: &PredictionResult) -> Self {
        let (height, width) = r.scores.shape();
        GridMetadata {
            species: r.species_name.clone(),
            taxon_key: r.taxon_key,
            method: r.method.clone(),
            method_description: r.method_description.clone(),
            height,
            width,
            transform: r.transform,
            bbox: r.bbox,
            n_occurrences: r.n_occurrences,
            n_negatives: r.n_negatives,
        }
    }
}

/// Pretty-printed JSON of any serializable value.
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
    writer.flush()?;
    Ok(())
}

/// Dense score grid as `row, col, lon, lat, score`, one line per pixel.
pub fn write_probability_tsv<P: AsRef<Path>>(result: &PredictionResult, path: P) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;

    writer.write_record(["row", "col", "lon", "lat", "score"])?;
    let (h, w) = result.scores.shape();
    for row in 0..h {
        for col in 0..w {
            let c = result.transform.pixel_to_coords(row, col);
            writer.write_record(&[
                row.to_string(),
                col.to_string(),
                format!("{:.6}", c.lon),
                format!("{:.6}", c.lat),
                format!("{:.6}", result.scores[(row, col)]),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_candidates<P: AsRef<Path>>(
    result: &PredictionResult,
    threshold: f32,
    max_points: usize,
    seed: u64,
    path: P,
) -> Result<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let candidates = result.candidates(threshold, max_points, &mut rng);
    write_json(&candidates, path)?;
    Ok(candidates.features.len())
}

pub fn write_occurrences<P: AsRef<Path>>(result: &PredictionResult, path: P) -> Result<()> {
    write_json(&occurrences_geojson(&result.occurrences), path)
}

/// Write every output of a prediction run into `out_dir`; returns the files written.
pub fn write_prediction<P: AsRef<Path>>(
    result: &PredictionResult,
    out_dir: P,
    threshold: f32,
    max_points: usize,
    seed: u64,
) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let probability = out_dir.join("probability.tsv");
    write_probability_tsv(result, &probability)?;
    let sidecar = out_dir.join("probability.json");
    write_json(&GridMetadata::from(result), &sidecar)?;

    let candidates = out_dir.join("candidates.geojson");
    let n = write_candidates(result, threshold, max_points, seed, &candidates)?;
    log::info!("Candidates: {} (threshold {})", n, threshold);

    let occurrences = out_dir.join("occurrences.geojson");
    write_occurrences(result, &occurrences)?;

    Ok(vec![probability, sidecar, candidates, occurrences])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coord;
    use crate::math::Array2;

    #[test]
    fn writes_all_prediction_files() {
        let bbox = BoundingBox::new(0.0, 0.0, 2.0, 1.0);
        let result = PredictionResult {
            species_name: "Testus exemplaris".into(),
            taxon_key: 7,
            method: "classifier".into(),
            method_description: "KNN classifier (k=10, 5x negatives)".into(),
            n_occurrences: 1,
            scores: Array2::from_shape_vec((1, 2), vec![0.2, 0.8]).unwrap(),
            transform: GeoTransform::from_bounds(&bbox, 1, 2),
            bbox,
            occurrences: vec![Coord::new(1.5, 0.5)],
            n_negatives: Some(5),
        };
        let dir = tempfile::tempdir().unwrap();
        let files = write_prediction(&result, dir.path(), 0.5, 100, 42).unwrap();
        assert_eq!(files.len(), 4);

        let tsv = std::fs::read_to_string(dir.path().join("probability.tsv")).unwrap();
        assert_eq!(tsv.lines().count(), 3);
        assert!(tsv.lines().nth(2).unwrap().ends_with("0.800000"));

        let meta: GridMetadata = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("probability.json")).unwrap(),
        )
        .unwrap();
        assert_eq!((meta.height, meta.width), (1, 2));

        let cand: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("candidates.geojson")).unwrap(),
        )
        .unwrap();
        assert_eq!(cand["features"].as_array().unwrap().len(), 1);
        assert_eq!(cand["metadata"]["n_candidates"], 1);
    }
}
