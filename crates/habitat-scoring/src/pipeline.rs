//! Prediction orchestration: occurrences -> embeddings -> method fit ->
//! full-grid scoring -> candidate extraction.
use std::cmp::Ordering;

use rand::Rng;

use crate::config::{FinderConfig, MethodType};
use crate::embedding::EmbeddingSource;
use crate::error::{FinderError, Result};
use crate::geo::{BoundingBox, Coord, GeoTransform};
use crate::geojson::{CandidateCollection, CandidateMetadata, CandidateProperties, Feature, FeatureCollection};
use crate::math::Array2;
use crate::methods::{build_method, Method, PredictionMethod};
use crate::occurrence::OccurrenceSource;
use crate::stats::ScoreSummary;

/// Candidate threshold for a calibrated classifier posterior.
pub const CLASSIFIER_THRESHOLD: f32 = 0.5;

/// Similarity scores bunch toward the middle of the range, so the cut is lower.
pub const SIMILARITY_THRESHOLD: f32 = 0.4;

pub fn default_threshold(method_name: &str) -> f32 {
    if method_name == "similarity" {
        SIMILARITY_THRESHOLD
    } else {
        CLASSIFIER_THRESHOLD
    }
}

/// Dense score map plus what is needed to place and describe it.
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub species_name: String,
    pub taxon_key: u64,
    pub method: String,
    pub method_description: String,
    pub n_occurrences: usize,
    /// `(height, width)` scores, aligned with `transform`.
    pub scores: Array2<f32>,
    pub transform: GeoTransform,
    pub bbox: BoundingBox,
    /// Positive coordinates that had valid embeddings.
    pub occurrences: Vec<Coord>,
    /// Pseudo-negatives used for fitting, if the method needed them.
    pub n_negatives: Option<usize>,
}

impl PredictionResult {
    pub fn threshold(&self) -> f32 {
        default_threshold(&self.method)
    }

    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary::from_scores(self.scores.as_slice())
    }

    /// Pixels scoring at least `threshold`, as points sorted by ascending score
    /// so the strongest candidates draw last. Randomly thinned to `max_points`.
    pub fn candidates<R: Rng + ?Sized>(
        &self,
        threshold: f32,
        max_points: usize,
        rng: &mut R,
    ) -> CandidateCollection {
        let (h, w) = self.scores.shape();
        let mut pixels: Vec<(usize, usize)> = Vec::new();
        for row in 0..h {
            for col in 0..w {
                if self.scores[(row, col)] >= threshold {
                    pixels.push((row, col));
                }
            }
        }

        if pixels.len() > max_points {
            let picked = rand::seq::index::sample(rng, pixels.len(), max_points);
            pixels = picked.into_iter().map(|i| pixels[i]).collect();
        }

        let mut features: Vec<Feature<CandidateProperties>> = pixels
            .into_iter()
            .map(|(row, col)| {
                Feature::point(
                    self.transform.pixel_to_coords(row, col),
                    CandidateProperties {
                        probability: self.scores[(row, col)],
                    },
                )
            })
            .collect();
        features.sort_by(|a, b| {
            a.properties
                .probability
                .partial_cmp(&b.properties.probability)
                .unwrap_or(Ordering::Equal)
        });

        let metadata = CandidateMetadata {
            species: self.species_name.clone(),
            taxon_key: self.taxon_key,
            method: self.method.clone(),
            n_occurrences: self.n_occurrences,
            n_candidates: features.len(),
            threshold,
            bbox: self.bbox.to_array(),
        };
        FeatureCollection::new(features, Some(metadata))
    }
}

/// A fitted method together with the full-grid scores it produced.
pub struct GridPrediction {
    pub method: Method,
    pub scores: Array2<f32>,
    pub n_negatives: Option<usize>,
}

/// Fit a method on already-sampled positives and score every grid pixel.
///
/// `Auto` picks similarity below five positives and the classifier otherwise.
/// The classifier draws its own pseudo-negatives inside `bbox` and samples
/// their embeddings from `source`.
pub fn score_grid<E>(
    source: &E,
    positives: &Array2<f32>,
    positive_coords: &[Coord],
    bbox: &BoundingBox,
    method_type: &MethodType,
    batch_size: usize,
) -> Result<GridPrediction>
where
    E: EmbeddingSource + ?Sized,
{
    let n_positive = positives.nrows();
    let resolved = method_type.resolve(n_positive);
    if let MethodType::Auto = method_type {
        log::info!(
            "Auto-selected: {} ({} samples)",
            resolved.name(),
            n_positive
        );
    }

    let mut method = build_method(&resolved, n_positive);
    log::info!("Method: {}", method.description());

    let mut n_negatives = None;
    if let Some(classifier) = method.as_classifier_mut() {
        classifier.set_spatial_context(positive_coords, *bbox);
        let negative_coords = classifier.get_negative_coords()?;
        let (negatives, _) = source.sample_at_coords(&negative_coords);
        let requested = match resolved {
            MethodType::Classifier { negative_ratio, .. } => positive_coords.len() * negative_ratio,
            _ => negative_coords.len(),
        };
        if negatives.nrows() < requested {
            log::warn!(
                "Negative samples: {} of {} requested",
                negatives.nrows(),
                requested
            );
        } else {
            log::info!("Negative samples: {}", negatives.nrows());
        }
        n_negatives = Some(negatives.nrows());
        method.fit(positives, Some(&negatives))?;
    } else {
        method.fit(positives, None)?;
    }

    let (h, w, _) = source.shape();
    let flat = method.predict(source.get_all_embeddings(), batch_size)?;
    let scores = Array2::from_shape_vec((h, w), flat)?;

    Ok(GridPrediction {
        method,
        scores,
        n_negatives,
    })
}

/// Fetch occurrences for `species_name`, sample their embeddings and score the grid.
pub fn find_candidates<E, O>(
    species_name: &str,
    bbox: &BoundingBox,
    source: &E,
    occurrences: &O,
    config: &FinderConfig,
) -> Result<PredictionResult>
where
    E: EmbeddingSource + ?Sized,
    O: OccurrenceSource + ?Sized,
{
    log::info!("Finding candidates for: {}", species_name);

    let species = occurrences.species_info(species_name)?;
    log::info!(
        "Matched: {} (key: {})",
        species.scientific_name,
        species.taxon_key
    );

    let coords = occurrences.occurrences(species.taxon_key, bbox)?;
    log::info!("Found {} occurrences in region", coords.len());
    if coords.is_empty() {
        return Err(FinderError::NoOccurrences {
            species: species_name.to_string(),
        });
    }

    let (h, w, d) = source.shape();
    log::info!("Embedding grid shape: {} x {} x {}", h, w, d);

    let (positives, valid_coords) = source.sample_at_coords(&coords);
    log::info!("Valid occurrence samples: {}", positives.nrows());
    if positives.nrows() == 0 {
        return Err(FinderError::NoValidEmbeddings {
            species: species_name.to_string(),
        });
    }

    let method_type = config.method_for(positives.nrows());
    let prediction = score_grid(
        source,
        &positives,
        &valid_coords,
        bbox,
        &method_type,
        config.batch_size,
    )?;

    let result = PredictionResult {
        species_name: species.canonical_name,
        taxon_key: species.taxon_key,
        method: prediction.method.name().to_string(),
        method_description: prediction.method.description(),
        n_occurrences: valid_coords.len(),
        scores: prediction.scores,
        transform: source.transform(),
        bbox: *bbox,
        occurrences: valid_coords,
        n_negatives: prediction.n_negatives,
    };
    result.summary().log();

    Ok(result)
}
