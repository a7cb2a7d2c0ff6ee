//! Scoring methods: centroid similarity and a pseudo-negative KNN classifier.
//!
//! Both variants sit behind `PredictionMethod`; `Method` is the closed set the
//! pipeline dispatches over, built by name through `factory`.
pub mod classifier;
pub mod factory;
pub mod similarity;

pub use classifier::ClassifierMethod;
pub use factory::{build_method, get_method};
pub use similarity::SimilarityMethod;

use crate::error::{FinderError, Result};
use crate::math::Array2;

pub trait PredictionMethod {
    /// Score every row of `all_embeddings` in [0, 1], `batch_size` rows at a time.
    fn predict(&self, all_embeddings: &Array2<f32>, batch_size: usize) -> Result<Vec<f32>>;

    /// Human-readable description of the method.
    fn description(&self) -> String;

    fn name(&self) -> &'static str;
}

pub enum Method {
    Similarity(SimilarityMethod),
    Classifier(ClassifierMethod),
}

impl Method {
    /// Fit on positives, plus negatives for the classifier (ignored by similarity).
    pub fn fit(&mut self, positives: &Array2<f32>, negatives: Option<&Array2<f32>>) -> Result<()> {
        match self {
            Method::Similarity(m) => m.fit(positives),
            Method::Classifier(m) => {
                let negatives = negatives.ok_or(FinderError::MissingNegatives)?;
                m.fit(positives, negatives)
            }
        }
    }

    pub fn needs_negatives(&self) -> bool {
        matches!(self, Method::Classifier(_))
    }

    pub fn as_classifier_mut(&mut self) -> Option<&mut ClassifierMethod> {
        match self {
            Method::Classifier(m) => Some(m),
            Method::Similarity(_) => None,
        }
    }
}

impl PredictionMethod for Method {
    fn predict(&self, all_embeddings: &Array2<f32>, batch_size: usize) -> Result<Vec<f32>> {
        match self {
            Method::Similarity(m) => m.predict(all_embeddings, batch_size),
            Method::Classifier(m) => m.predict(all_embeddings, batch_size),
        }
    }

    fn description(&self) -> String {
        match self {
            Method::Similarity(m) => m.description(),
            Method::Classifier(m) => m.description(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Method::Similarity(m) => m.name(),
            Method::Classifier(m) => m.name(),
        }
    }
}
