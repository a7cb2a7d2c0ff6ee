//! `habitat find`: score a region for one species and write the outputs.
use std::path::PathBuf;

use anyhow::{Context, Result};

use habitat_scoring::config::{FinderConfig, MethodType, SimilarityMetric};
use habitat_scoring::geo::{resolve_bbox, BoundingBox};
use habitat_scoring::io::{read_embedding_tsv, read_occurrence_tsv, write_prediction};
use habitat_scoring::pipeline::{default_threshold, find_candidates, PredictionResult};

#[derive(Debug, Clone)]
pub struct FindArgs {
    pub species: String,
    pub region: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub embeddings: PathBuf,
    pub occurrences: PathBuf,
    pub output_dir: PathBuf,
    /// Raster shape (rows, cols); inferred from the file when unset.
    pub shape: Option<(usize, usize)>,
    pub config: FinderConfig,
}

/// Apply `--method` and `--metric` on top of a loaded configuration.
pub fn apply_overrides(
    config: &mut FinderConfig,
    method: Option<&str>,
    metric: Option<&str>,
) -> Result<()> {
    if let Some(name) = method {
        config.method = name.parse::<MethodType>()?;
    }
    if let Some(name) = metric {
        let metric: SimilarityMetric = name.parse().map_err(anyhow::Error::msg)?;
        if let MethodType::Classifier { .. } = config.method {
            log::warn!("--metric only applies to similarity scoring; ignored for classifier");
        }
        config.metric = Some(metric);
    }
    Ok(())
}

pub fn run_find(args: &FindArgs) -> Result<(PredictionResult, Vec<PathBuf>)> {
    let bbox = resolve_bbox(args.region.as_deref(), args.bbox)?;
    log::info!("Region: {}", bbox);

    let grid = read_embedding_tsv(&args.embeddings, &bbox, args.shape)?;
    let occurrences = read_occurrence_tsv(&args.occurrences)?;

    let result = find_candidates(&args.species, &bbox, &grid, &occurrences, &args.config)
        .with_context(|| format!("Candidate search failed for {}", args.species))?;

    let threshold = args
        .config
        .threshold
        .unwrap_or_else(|| default_threshold(&result.method));
    let files = write_prediction(
        &result,
        &args.output_dir,
        threshold,
        args.config.max_points,
        args.config.candidate_seed,
    )?;
    for f in &files {
        log::info!("Saved: {}", f.display());
    }
    Ok((result, files))
}
