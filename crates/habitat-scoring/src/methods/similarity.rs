use crate::config::SimilarityMetric;
use crate::error::{FinderError, Result};
use crate::math::vector::{dot, euclidean, l2_norm, mean_row};
use crate::math::Array2;
use crate::methods::PredictionMethod;
use crate::preprocessing::{fit_scaler, Scaler};

/// Scores each pixel by its closeness to the centroid of the positive samples.
///
/// Works from a single positive sample upwards, which makes it the method of
/// choice for data-deficient species.
///
/// Euclidean scoring standardizes by the positive mean and std. Cosine scoring
/// only divides by the positive std: it is not mean-centered.
pub struct SimilarityMethod {
    metric: SimilarityMetric,
    state: Option<SimilarityState>,
}

struct SimilarityState {
    scaler: Scaler,
    centroid: Vec<f32>,
}

impl SimilarityMethod {
    pub fn new(metric: SimilarityMetric) -> Self {
        SimilarityMethod {
            metric,
            state: None,
        }
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Fitted centroid in standardized space (unit length for cosine).
    pub fn centroid(&self) -> Option<&[f32]> {
        self.state.as_ref().map(|s| s.centroid.as_slice())
    }

    /// Fit the scaler and centroid from the positive embeddings alone.
    pub fn fit(&mut self, positives: &Array2<f32>) -> Result<()> {
        if positives.nrows() == 0 {
            return Err(FinderError::InsufficientData {
                what: "similarity positives",
                required: 1,
                found: 0,
            });
        }

        let fitted = fit_scaler(positives)?;
        // Centering on the positive mean maps the centroid to the origin, which
        // has no direction; cosine keeps the scale and drops the shift.
        let scaler = match self.metric {
            SimilarityMetric::Cosine => fitted.without_centering(),
            SimilarityMetric::Euclidean => fitted,
        };

        let dim = positives.ncols();
        let standardized: Vec<Vec<f32>> = positives.rows().map(|r| scaler.transform_row(r)).collect();
        let mut centroid = mean_row(standardized.iter().map(|r| r.as_slice()), dim)
            .ok_or(FinderError::InsufficientData {
                what: "similarity positives",
                required: 1,
                found: 0,
            })?;

        if self.metric == SimilarityMetric::Cosine {
            let norm = l2_norm(&centroid);
            if norm > 0.0 {
                centroid.iter_mut().for_each(|c| *c /= norm);
            } else {
                log::warn!("Positive centroid has zero norm; cosine scores will be flat");
            }
        }

        log::debug!(
            "Fitted {} similarity on {} positives ({} dims)",
            self.metric,
            positives.nrows(),
            dim
        );
        self.state = Some(SimilarityState { scaler, centroid });
        Ok(())
    }
}

impl PredictionMethod for SimilarityMethod {
    fn predict(&self, all_embeddings: &Array2<f32>, batch_size: usize) -> Result<Vec<f32>> {
        let state = self.state.as_ref().ok_or(FinderError::NotFitted)?;
        let dim = state.centroid.len();
        if all_embeddings.ncols() != dim {
            return Err(FinderError::DimensionMismatch {
                expected: dim,
                found: all_embeddings.ncols(),
            });
        }

        let n_samples = all_embeddings.nrows();
        let mut scores = Vec::with_capacity(n_samples);
        let mut buf = vec![0.0f32; dim];

        for (start, batch) in all_embeddings.row_batches(batch_size) {
            log::trace!(
                "Computing similarity for rows {}..{} of {}",
                start,
                start + batch.nrows(),
                n_samples
            );
            for row in batch.rows() {
                state.scaler.transform_row_into(row, &mut buf);
                let score = match self.metric {
                    SimilarityMetric::Cosine => {
                        let norm = l2_norm(&buf);
                        let norm = if norm == 0.0 { 1.0 } else { norm };
                        let similarity = dot(&buf, &state.centroid) / norm;
                        ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
                    }
                    // raw distance for now, rescaled once every batch is done
                    SimilarityMetric::Euclidean => euclidean(&buf, &state.centroid),
                };
                scores.push(score);
            }
        }

        if self.metric == SimilarityMetric::Euclidean {
            let max_dist = scores.iter().copied().fold(0.0f32, f32::max);
            let max_dist = if max_dist > 0.0 { max_dist } else { 1.0 };
            for s in scores.iter_mut() {
                *s = (1.0 - *s / max_dist).clamp(0.0, 1.0);
            }
        }

        Ok(scores)
    }

    fn description(&self) -> String {
        format!("Similarity to centroid ({})", self.metric)
    }

    fn name(&self) -> &'static str {
        "similarity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positives() -> Array2<f32> {
        Array2::from_shape_vec(
            (3, 3),
            vec![
                1.0, 0.1, 0.0, //
                1.1, 0.0, 0.1, //
                0.9, 0.05, 0.05,
            ],
        )
        .unwrap()
    }

    #[test]
    fn fit_with_no_positives_fails() {
        let mut m = SimilarityMethod::new(SimilarityMetric::Cosine);
        let err = m.fit(&Array2::empty(3)).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn predict_before_fit_fails() {
        let m = SimilarityMethod::new(SimilarityMetric::Euclidean);
        assert_eq!(m.predict(&positives(), 10), Err(FinderError::NotFitted));
    }

    #[test]
    fn cosine_centroid_is_unit_length() {
        let mut m = SimilarityMethod::new(SimilarityMetric::Cosine);
        m.fit(&positives()).unwrap();
        let c = m.centroid().unwrap();
        assert!((l2_norm(c) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_ignores_per_dimension_units() {
        let query = Array2::from_shape_vec(
            (3, 3),
            vec![1.0, 0.1, 0.0, 0.2, 0.7, 0.1, 0.1, 0.1, 0.9],
        )
        .unwrap();
        let rescale = |a: &Array2<f32>| {
            let data: Vec<f32> = a
                .as_slice()
                .iter()
                .enumerate()
                .map(|(i, &v)| if i % 3 == 0 { v * 100.0 } else { v })
                .collect();
            Array2::from_shape_vec(a.shape(), data).unwrap()
        };

        let mut plain = SimilarityMethod::new(SimilarityMetric::Cosine);
        plain.fit(&positives()).unwrap();
        let mut scaled = SimilarityMethod::new(SimilarityMetric::Cosine);
        scaled.fit(&rescale(&positives())).unwrap();

        let a = plain.predict(&query, 10).unwrap();
        let b = scaled.predict(&rescale(&query), 10).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-4, "{:?} vs {:?}", a, b);
        }
        assert!(a[0] > a[1] && a[0] > a[2]);
    }

    #[test]
    fn single_positive_scores_itself_highest() {
        let single = Array2::from_shape_vec((1, 3), vec![0.2, 0.7, 0.1]).unwrap();
        let mut m = SimilarityMethod::new(SimilarityMetric::Cosine);
        m.fit(&single).unwrap();
        let query = Array2::from_shape_vec(
            (3, 3),
            vec![0.2, 0.7, 0.1, 0.7, 0.2, 0.1, 0.1, 0.1, 0.9],
        )
        .unwrap();
        let s = m.predict(&query, 2).unwrap();
        assert!((s[0] - 1.0).abs() < 1e-5, "{:?}", s);
        assert!(s[0] > s[1] && s[0] > s[2]);
    }

    #[test]
    fn euclidean_scores_fall_with_distance() {
        let mut m = SimilarityMethod::new(SimilarityMetric::Euclidean);
        m.fit(&positives()).unwrap();
        let query = Array2::from_shape_vec(
            (3, 3),
            vec![1.0, 0.05, 0.05, 1.5, 0.3, 0.3, 3.0, 1.0, 1.0],
        )
        .unwrap();
        let s = m.predict(&query, 1).unwrap();
        assert!(s[0] > s[1] && s[1] > s[2], "{:?}", s);
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn euclidean_scores_ignore_batch_boundaries() {
        let mut m = SimilarityMethod::new(SimilarityMetric::Euclidean);
        m.fit(&positives()).unwrap();
        let query = Array2::from_shape_vec(
            (4, 3),
            vec![1.0, 0.05, 0.05, 1.5, 0.3, 0.3, 3.0, 1.0, 1.0, 0.2, 0.2, 0.2],
        )
        .unwrap();
        assert_eq!(m.predict(&query, 1).unwrap(), m.predict(&query, 4).unwrap());
    }

    #[test]
    fn description_names_metric() {
        let m = SimilarityMethod::new(SimilarityMetric::Cosine);
        assert_eq!(m.description(), "Similarity to centroid (cosine)");
    }
}
