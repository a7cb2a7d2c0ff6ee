use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{FinderError, Result};
use crate::geo::{BoundingBox, Coord};
use crate::math::Array2;
use crate::methods::PredictionMethod;
use crate::models::{ClassifierModel, KNeighborsClassifier};
use crate::preprocessing::{fit_scaler, transform_all, Scaler};
use crate::sampling::sample_spatial_negatives;

/// KNN classifier trained against pseudo-negative background points.
///
/// Negatives are random locations assumed to be unsuitable or unsampled, so
/// the posterior is only as good as that assumption. Needs more samples than
/// `SimilarityMethod` to be useful.
pub struct ClassifierMethod {
    n_neighbors: usize,
    negative_ratio: usize,
    min_negative_distance: f64,
    seed: u64,
    positive_coords: Option<Vec<Coord>>,
    bbox: Option<BoundingBox>,
    state: Option<ClassifierState>,
}

struct ClassifierState {
    scaler: Scaler,
    model: KNeighborsClassifier,
}

impl ClassifierMethod {
    pub fn new(n_neighbors: usize, negative_ratio: usize, min_negative_distance: f64, seed: u64) -> Self {
        ClassifierMethod {
            n_neighbors,
            negative_ratio,
            min_negative_distance,
            seed,
            positive_coords: None,
            bbox: None,
            state: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Neighbour count actually used by the fitted model.
    pub fn effective_k(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.model.n_neighbors())
    }

    /// Positive locations and the region negatives are drawn from.
    pub fn set_spatial_context(&mut self, positive_coords: &[Coord], bbox: BoundingBox) {
        self.positive_coords = Some(positive_coords.to_vec());
        self.bbox = Some(bbox);
    }

    /// `negative_ratio` background coordinates per positive, possibly fewer
    /// when the region is too crowded. Same seed, same coordinates.
    pub fn get_negative_coords(&self) -> Result<Vec<Coord>> {
        let (positives, bbox) = match (&self.positive_coords, &self.bbox) {
            (Some(p), Some(b)) => (p, b),
            _ => return Err(FinderError::MissingSpatialContext),
        };
        let n_negatives = positives.len() * self.negative_ratio;
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(sample_spatial_negatives(
            positives,
            bbox,
            n_negatives,
            self.min_negative_distance,
            &mut rng,
        ))
    }

    /// Standardize positives and negatives together and train the neighbour model.
    pub fn fit(&mut self, positives: &Array2<f32>, negatives: &Array2<f32>) -> Result<()> {
        if positives.nrows() < 2 {
            return Err(FinderError::InsufficientData {
                what: "classifier positives",
                required: 2,
                found: positives.nrows(),
            });
        }

        let x = positives.vstack(negatives)?;
        let y: Vec<i32> = std::iter::repeat(1)
            .take(positives.nrows())
            .chain(std::iter::repeat(0).take(negatives.nrows()))
            .collect();

        // k shrinks with the training set so tiny inputs still fit
        let k = self.n_neighbors.min(x.nrows() / 2).max(1);

        let scaler = fit_scaler(&x)?;
        let scaled = transform_all(&x, &scaler)?;
        let mut model = KNeighborsClassifier::new(k);
        model.fit(&scaled, &y)?;

        log::debug!(
            "Fitted KNN (k={}) on {} positives and {} negatives",
            k,
            positives.nrows(),
            negatives.nrows()
        );
        self.state = Some(ClassifierState { scaler, model });
        Ok(())
    }
}

impl Default for ClassifierMethod {
    fn default() -> Self {
        ClassifierMethod::new(10, 5, 0.005, 42)
    }
}

impl PredictionMethod for ClassifierMethod {
    fn predict(&self, all_embeddings: &Array2<f32>, batch_size: usize) -> Result<Vec<f32>> {
        let state = self.state.as_ref().ok_or(FinderError::NotFitted)?;
        let n_samples = all_embeddings.nrows();
        let mut probabilities = Vec::with_capacity(n_samples);

        for (start, batch) in all_embeddings.row_batches(batch_size) {
            log::trace!(
                "Classifying rows {}..{} of {}",
                start,
                start + batch.nrows(),
                n_samples
            );
            let scaled = transform_all(&batch.to_array(), &state.scaler)?;
            probabilities.extend(state.model.predict_proba(&scaled)?);
        }

        Ok(probabilities)
    }

    fn description(&self) -> String {
        format!(
            "KNN classifier (k={}, {}x negatives)",
            self.n_neighbors, self.negative_ratio
        )
    }

    fn name(&self) -> &'static str {
        "classifier"
    }
}
