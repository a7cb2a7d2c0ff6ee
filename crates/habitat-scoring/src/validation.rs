//! Trial-based validation of how discrimination improves with the number of
//! training positives.
//!
//! For every species and every training size `n_pos`, each trial shuffles the
//! valid occurrences with its own seeded generator, trains a logistic model on
//! `n_pos` positives against as many background pixels, then scores the
//! held-out positives against a matching number of fresh background pixels.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::ValidationConfig;
use crate::embedding::EmbeddingSource;
use crate::error::Result;
use crate::geo::{self, BoundingBox, Coord};
use crate::math::Array2;
use crate::models::{ClassifierModel, LogisticRegressionModel};
use crate::occurrence::OccurrenceSource;
use crate::sampling::sample_grid_negatives;
use crate::stats::{compute_auc, mean_score, mean_std};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lon: f64,
    pub lat: f64,
}

impl From<Coord> for Location {
    fn from(c: Coord) -> Self {
        Location {
            lon: c.lon,
            lat: c.lat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredLocation {
    pub lon: f64,
    pub lat: f64,
    pub score: f32,
}

fn scored(coords: &[Coord], scores: &[f32]) -> Vec<ScoredLocation> {
    coords
        .iter()
        .zip(scores)
        .map(|(c, &score)| ScoredLocation {
            lon: c.lon,
            lat: c.lat,
            score,
        })
        .collect()
}

/// Full input and output detail of one seeded trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub seed: u64,
    pub auc: f64,
    pub mean_positive: f64,
    pub mean_negative: f64,
    pub n_test_positive: usize,
    pub n_test_negative: usize,
    pub train_positive: Vec<Location>,
    pub train_negative: Vec<Location>,
    pub test_positive: Vec<ScoredLocation>,
    pub test_negative: Vec<ScoredLocation>,
}

/// All trials for one training size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub n_positive: usize,
    pub n_negative: usize,
    pub n_trials: usize,
    pub auc_mean: f64,
    /// Population standard deviation across trials.
    pub auc_std: f64,
    pub trials: Vec<TrialResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesExperiment {
    pub species: String,
    pub species_key: u64,
    pub region: String,
    pub n_occurrences: usize,
    pub n_trials: usize,
    pub experiments: Vec<ExperimentResult>,
}

impl SpeciesExperiment {
    /// File stem used for the per-species record, e.g. `quercus_robur`.
    pub fn slug(&self) -> String {
        species_slug(&self.species)
    }
}

pub fn species_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSummary {
    pub n_positive: usize,
    pub auc_mean: f64,
    pub auc_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub species: String,
    pub n_occurrences: usize,
    pub results: Vec<SizeSummary>,
}

/// Compact cross-species view without coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub region: String,
    pub base_seed: u64,
    pub n_trials: usize,
    pub n_positive_values: Vec<usize>,
    pub species: Vec<SpeciesSummary>,
}

/// Whether a training size leaves too few held-out positives to evaluate.
pub fn skip_training_size(n_pos: usize, n_total: usize, min_test_positives: usize) -> bool {
    n_pos + min_test_positives >= n_total
}

/// Run one trial with a generator freshly seeded from `seed`.
///
/// `positives` and `coords` are the valid occurrence embeddings and their
/// locations, row-aligned.
pub fn run_single_trial<E>(
    n_pos: usize,
    positives: &Array2<f32>,
    coords: &[Coord],
    source: &E,
    seed: u64,
    max_iterations: u64,
) -> Result<TrialResult>
where
    E: EmbeddingSource + ?Sized,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let n_total = coords.len();

    let mut order: Vec<usize> = (0..n_total).collect();
    order.shuffle(&mut rng);
    let shuffled_coords: Vec<Coord> = order.iter().map(|&i| coords[i]).collect();

    let n_pos = n_pos.min(n_total);
    let (train_idx, test_idx) = order.split_at(n_pos);
    let train_pos = positives.select_rows(train_idx);
    let test_pos = positives.select_rows(test_idx);
    let train_pos_coords = &shuffled_coords[..n_pos];
    let test_pos_coords = &shuffled_coords[n_pos..];
    let n_test = test_pos_coords.len();

    // background for training, one per training positive
    let (train_neg, train_neg_coords) =
        sample_grid_negatives(source, n_pos, &shuffled_coords, &mut rng);

    // background for evaluation, one per held-out positive, never reusing training pixels
    let mut exclude = shuffled_coords.clone();
    exclude.extend_from_slice(&train_neg_coords);
    let (test_neg, test_neg_coords) = sample_grid_negatives(source, n_test, &exclude, &mut rng);

    let x = train_pos.vstack(&train_neg)?;
    let y: Vec<i32> = std::iter::repeat(1)
        .take(train_pos.nrows())
        .chain(std::iter::repeat(0).take(train_neg.nrows()))
        .collect();
    let mut model = LogisticRegressionModel::new(max_iterations);
    let (pos_scores, neg_scores, auc) = match model.fit(&x, &y) {
        Ok(()) => {
            let pos_scores = model.predict_proba(&test_pos)?;
            let neg_scores = model.predict_proba(&test_neg)?;
            let auc = compute_auc(&pos_scores, &neg_scores);
            (pos_scores, neg_scores, auc)
        }
        // no background left to train against: the trial is scored as chance
        Err(e) if e.is_insufficient_data() => {
            log::warn!("Trial with seed {} is degenerate ({}); AUC set to 0.5", seed, e);
            (vec![0.5; test_pos.nrows()], vec![0.5; test_neg.nrows()], 0.5)
        }
        Err(e) => return Err(e),
    };

    Ok(TrialResult {
        seed,
        auc,
        mean_positive: mean_score(&pos_scores),
        mean_negative: mean_score(&neg_scores),
        n_test_positive: n_test,
        n_test_negative: test_neg_coords.len(),
        train_positive: train_pos_coords.iter().map(|&c| c.into()).collect(),
        train_negative: train_neg_coords.iter().map(|&c| c.into()).collect(),
        test_positive: scored(test_pos_coords, &pos_scores),
        test_negative: scored(&test_neg_coords, &neg_scores),
    })
}

/// Sweep every configured training size for one species.
///
/// Returns `Ok(None)` when the species has fewer than `min_occurrences` valid
/// samples in the region.
pub fn run_species_experiment<E, O>(
    species_name: &str,
    bbox: &BoundingBox,
    source: &E,
    occurrences: &O,
    config: &ValidationConfig,
) -> Result<Option<SpeciesExperiment>>
where
    E: EmbeddingSource + ?Sized,
    O: OccurrenceSource + ?Sized,
{
    log::info!("Species: {}", species_name);

    let info = occurrences.species_info(species_name)?;
    let coords = occurrences.occurrences(info.taxon_key, bbox)?;
    log::info!("Total occurrences: {}", coords.len());

    let (positives, valid_coords) = source.sample_at_coords(&coords);
    let n_total = valid_coords.len();
    log::info!("Valid with embeddings: {}", n_total);

    if n_total < config.min_occurrences {
        log::info!(
            "Not enough occurrences ({} < {}), skipping",
            n_total,
            config.min_occurrences
        );
        return Ok(None);
    }

    let mut experiments = Vec::new();
    for &n_pos in &config.n_positive_values {
        if skip_training_size(n_pos, n_total, config.min_test_positives) {
            log::debug!(
                "Skipping n_positive = {}: fewer than {} test positives remain",
                n_pos,
                config.min_test_positives
            );
            continue;
        }
        log::info!(
            "n_positive = {} (+ {} negative = {} total training)",
            n_pos,
            n_pos,
            n_pos * 2
        );

        let mut trials = Vec::with_capacity(config.n_trials);
        for trial_idx in 0..config.n_trials {
            let seed = config.base_seed + trial_idx as u64;
            trials.push(run_single_trial(
                n_pos,
                &positives,
                &valid_coords,
                source,
                seed,
                config.logistic_max_iterations,
            )?);
        }

        let aucs: Vec<f64> = trials.iter().map(|t| t.auc).collect();
        let (auc_mean, auc_std) = mean_std(&aucs).unwrap_or((0.5, 0.0));
        log::info!(
            "  AUC: {:.3} +/- {:.3} (n={} trials)",
            auc_mean,
            auc_std,
            config.n_trials
        );

        experiments.push(ExperimentResult {
            n_positive: n_pos,
            n_negative: n_pos,
            n_trials: config.n_trials,
            auc_mean,
            auc_std,
            trials,
        });
    }

    Ok(Some(SpeciesExperiment {
        species: species_name.to_string(),
        species_key: info.taxon_key,
        region: config.region.clone(),
        n_occurrences: n_total,
        n_trials: config.n_trials,
        experiments,
    }))
}

/// Results of a whole validation sweep.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub experiments: Vec<SpeciesExperiment>,
    pub summary: ValidationSummary,
}

/// Run every configured species over the configured region.
///
/// Species that fail for lack of data are logged and left out; any other
/// failure aborts the sweep.
pub fn run_validation<E, O>(
    source: &E,
    occurrences: &O,
    config: &ValidationConfig,
) -> Result<ValidationRun>
where
    E: EmbeddingSource + ?Sized,
    O: OccurrenceSource + ?Sized,
{
    let bbox = geo::region(&config.region)?.bbox;
    log::info!(
        "Classifier validation over {} ({} trials per n value)",
        config.region,
        config.n_trials
    );

    let mut experiments = Vec::new();
    for species in &config.species {
        match run_species_experiment(species, &bbox, source, occurrences, config) {
            Ok(Some(experiment)) => experiments.push(experiment),
            Ok(None) => {}
            Err(e) if e.is_insufficient_data() => {
                log::warn!("Skipping {}: {}", species, e);
            }
            Err(e) => return Err(e),
        }
    }

    let summary = summarize(&experiments, config);
    Ok(ValidationRun {
        experiments,
        summary,
    })
}

pub fn summarize(experiments: &[SpeciesExperiment], config: &ValidationConfig) -> ValidationSummary {
    ValidationSummary {
        region: config.region.clone(),
        base_seed: config.base_seed,
        n_trials: config.n_trials,
        n_positive_values: config.n_positive_values.clone(),
        species: experiments
            .iter()
            .map(|e| SpeciesSummary {
                species: e.species.clone(),
                n_occurrences: e.n_occurrences,
                results: e
                    .experiments
                    .iter()
                    .map(|x| SizeSummary {
                        n_positive: x.n_positive,
                        auc_mean: x.auc_mean,
                        auc_std: x.auc_std,
                    })
                    .collect(),
            })
            .collect(),
    }
}

impl ValidationSummary {
    /// Log the species / n_pos / AUC table.
    pub fn log_table(&self) {
        log::info!("{:<25} {:>6} {:>10} {:>10}", "Species", "n_pos", "AUC mean", "AUC std");
        log::info!("{}", "-".repeat(56));
        for sp in &self.species {
            for r in &sp.results {
                log::info!(
                    "{:<25} {:>6} {:>10.3} {:>10.3}",
                    sp.species,
                    r.n_positive,
                    r.auc_mean,
                    r.auc_std
                );
            }
        }
    }
}
