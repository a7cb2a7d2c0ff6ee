use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FinderError;

/// Rows scored per batch during full-grid prediction.
pub const DEFAULT_BATCH_SIZE: usize = 15000;

/// Below this many positives, `auto` falls back to similarity scoring.
pub const AUTO_CLASSIFIER_MIN_SAMPLES: usize = 5;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" => Ok(SimilarityMetric::Euclidean),
            _ => Err(format!("Unknown metric: {}. Available: cosine, euclidean", s)),
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

/// Supported scoring methods and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MethodType {
    /// Resolved from the positive sample count at run time.
    #[default]
    Auto,
    Similarity {
        metric: SimilarityMetric,
    },
    Classifier {
        n_neighbors: usize,
        negative_ratio: usize,
        min_negative_distance: f64,
        seed: u64,
    },
}

impl MethodType {
    pub fn similarity() -> Self {
        MethodType::Similarity {
            metric: SimilarityMetric::default(),
        }
    }

    pub fn classifier() -> Self {
        MethodType::Classifier {
            n_neighbors: 10,
            negative_ratio: 5,
            min_negative_distance: 0.005,
            seed: 42,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MethodType::Auto => "auto",
            MethodType::Similarity { .. } => "similarity",
            MethodType::Classifier { .. } => "classifier",
        }
    }

    /// Replace `Auto` with a concrete method for `n_positive` samples.
    pub fn resolve(&self, n_positive: usize) -> MethodType {
        match self {
            MethodType::Auto if n_positive < AUTO_CLASSIFIER_MIN_SAMPLES => MethodType::similarity(),
            MethodType::Auto => MethodType::classifier(),
            other => other.clone(),
        }
    }

    /// Swap in `metric` if this is a similarity method; other methods are unchanged.
    pub fn with_metric(self, metric: SimilarityMetric) -> MethodType {
        match self {
            MethodType::Similarity { .. } => MethodType::Similarity { metric },
            other => other,
        }
    }
}

impl FromStr for MethodType {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(MethodType::Auto),
            "similarity" => Ok(MethodType::similarity()),
            "classifier" => Ok(MethodType::classifier()),
            _ => Err(FinderError::UnknownMethod(s.to_string())),
        }
    }
}

/// Settings for a single `find_candidates` run.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct FinderConfig {
    pub method: MethodType,
    /// Similarity metric, applied whenever the run ends up scoring by
    /// similarity, including when `auto` falls back to it.
    pub metric: Option<SimilarityMetric>,
    pub batch_size: usize,
    /// Overrides the per-method candidate threshold when set.
    pub threshold: Option<f32>,
    pub max_points: usize,
    /// Seed for subsampling candidate points.
    pub candidate_seed: u64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            method: MethodType::Auto,
            metric: None,
            batch_size: DEFAULT_BATCH_SIZE,
            threshold: None,
            max_points: 5000,
            candidate_seed: 42,
        }
    }
}

impl FinderConfig {
    /// Concrete method for `n_positive` samples, with the metric override applied.
    pub fn method_for(&self, n_positive: usize) -> MethodType {
        let resolved = self.method.resolve(n_positive);
        if self.method == MethodType::Auto {
            log::info!(
                "Auto-selected: {} ({} samples)",
                resolved.name(),
                n_positive
            );
        }
        match self.metric {
            Some(metric) => resolved.with_metric(metric),
            None => resolved,
        }
    }
}

/// Settings for the trial-based validation sweep.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    pub species: Vec<String>,
    pub region: String,
    pub n_positive_values: Vec<usize>,
    pub n_trials: usize,
    pub base_seed: u64,
    /// Held-out positives required for a training size to run.
    pub min_test_positives: usize,
    /// Valid occurrences required for a species to run at all.
    pub min_occurrences: usize,
    pub logistic_max_iterations: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            species: vec!["Quercus robur".to_string(), "Fraxinus excelsior".to_string()],
            region: "cambridge".to_string(),
            n_positive_values: vec![1, 2, 5, 10, 20, 50, 100],
            n_trials: 5,
            base_seed: 42,
            min_test_positives: 10,
            min_occurrences: 25,
            logistic_max_iterations: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!("AUTO".parse::<MethodType>().unwrap(), MethodType::Auto);
        assert_eq!(
            "Similarity".parse::<MethodType>().unwrap(),
            MethodType::similarity()
        );
        assert_eq!(
            "unknown".parse::<MethodType>(),
            Err(FinderError::UnknownMethod("unknown".to_string()))
        );
    }

    #[test]
    fn auto_switches_at_five_samples() {
        assert_eq!(MethodType::Auto.resolve(4).name(), "similarity");
        assert_eq!(MethodType::Auto.resolve(5).name(), "classifier");
        assert_eq!(MethodType::similarity().resolve(100).name(), "similarity");
    }

    #[test]
    fn metric_applies_when_auto_falls_back_to_similarity() {
        let cfg = FinderConfig {
            metric: Some(SimilarityMetric::Euclidean),
            ..FinderConfig::default()
        };
        assert_eq!(
            cfg.method_for(3),
            MethodType::Similarity {
                metric: SimilarityMetric::Euclidean
            }
        );
        assert_eq!(cfg.method_for(10), MethodType::classifier());
        assert_eq!(FinderConfig::default().method_for(3), MethodType::similarity());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: ValidationConfig = serde_json::from_str(r#"{"n_trials": 3}"#).unwrap();
        assert_eq!(cfg.n_trials, 3);
        assert_eq!(cfg.base_seed, 42);
        assert_eq!(cfg.n_positive_values, vec![1, 2, 5, 10, 20, 50, 100]);

        let cfg: FinderConfig =
            serde_json::from_str(r#"{"method": {"similarity": {"metric": "euclidean"}}}"#).unwrap();
        assert_eq!(
            cfg.method,
            MethodType::Similarity {
                metric: SimilarityMetric::Euclidean
            }
        );
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
    }
}
