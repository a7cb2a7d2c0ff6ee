//! Discrimination and score-distribution statistics.
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Probability that a random positive outscores a random negative.
///
/// Uses the full pairwise comparison over `pos_scores x neg_scores`; ties
/// count as losses. Returns 0.5 when either side is empty.
pub fn compute_auc(pos_scores: &[f32], neg_scores: &[f32]) -> f64 {
    let n_comparisons = pos_scores.len() * neg_scores.len();
    if n_comparisons == 0 {
        return 0.5;
    }
    let n_correct: usize = pos_scores
        .iter()
        .map(|p| neg_scores.iter().filter(|&n| p > n).count())
        .sum();
    n_correct as f64 / n_comparisons as f64
}

/// Mean and population standard deviation; `None` for an empty slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    Some((values.mean(), values.population_std_dev()))
}

/// Mean of a score slice, 0 when empty.
pub fn mean_score(scores: &[f32]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).mean()
}

/// Summary of a dense score map, logged after full-grid prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub n_high: usize,
    pub n_total: usize,
    pub high_threshold: f32,
}

impl ScoreSummary {
    pub const HIGH_SCORE: f32 = 0.7;

    pub fn from_scores(scores: &[f32]) -> Self {
        let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let n_high = scores.iter().filter(|&&s| s > Self::HIGH_SCORE).count();
        ScoreSummary {
            min: if scores.is_empty() { 0.0 } else { min },
            max: if scores.is_empty() { 0.0 } else { max },
            mean: mean_score(scores),
            n_high,
            n_total: scores.len(),
            high_threshold: Self::HIGH_SCORE,
        }
    }

    pub fn high_fraction(&self) -> f64 {
        if self.n_total == 0 {
            0.0
        } else {
            self.n_high as f64 / self.n_total as f64
        }
    }

    pub fn log(&self) {
        log::info!("Score range: {:.3} - {:.3}", self.min, self.max);
        log::info!(
            "High score pixels (>{}): {} ({:.1}%)",
            self.high_threshold,
            self.n_high,
            100.0 * self.high_fraction()
        );
    }
}
