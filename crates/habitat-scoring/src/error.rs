use std::error::Error;
use std::fmt;

use crate::math::ShapeError;

pub type Result<T> = std::result::Result<T, FinderError>;

/// Failures raised while sampling, fitting or scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum FinderError {
    /// `predict` was called before `fit`.
    NotFitted,
    UnknownMethod(String),
    /// Neither a named region nor an explicit bounding box was supplied.
    MissingRegion,
    UnknownRegion(String),
    /// Negative coordinates were requested before `set_spatial_context`.
    MissingSpatialContext,
    /// The classifier was fit without a negative sample set.
    MissingNegatives,
    DimensionMismatch { expected: usize, found: usize },
    InsufficientData {
        what: &'static str,
        required: usize,
        found: usize,
    },
    SpeciesNotFound(String),
    NoOccurrences { species: String },
    NoValidEmbeddings { species: String },
    Model(String),
    Shape(String),
}

impl FinderError {
    /// Whether the failure means "not enough data for this species" rather than a usage mistake.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            FinderError::InsufficientData { .. }
                | FinderError::SpeciesNotFound(_)
                | FinderError::NoOccurrences { .. }
                | FinderError::NoValidEmbeddings { .. }
        )
    }
}

impl fmt::Display for FinderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FinderError::NotFitted => write!(f, "method must be fit before predict"),
            FinderError::UnknownMethod(name) => write!(
                f,
                "Unknown method: {}. Available: auto, similarity, classifier",
                name
            ),
            FinderError::MissingRegion => write!(f, "specify a region or a bounding box"),
            FinderError::UnknownRegion(name) => write!(f, "Unknown region: {}", name),
            FinderError::MissingSpatialContext => {
                write!(f, "set_spatial_context must be called before generating negatives")
            }
            FinderError::MissingNegatives => write!(
                f,
                "classifier needs negative embeddings; sample them at get_negative_coords()"
            ),
            FinderError::DimensionMismatch { expected, found } => write!(
                f,
                "embedding dimension mismatch: expected {}, found {}",
                expected, found
            ),
            FinderError::InsufficientData {
                what,
                required,
                found,
            } => write!(
                f,
                "{} require at least {} samples, got {}",
                what, required, found
            ),
            FinderError::SpeciesNotFound(name) => write!(f, "No species matched '{}'", name),
            FinderError::NoOccurrences { species } => write!(
                f,
                "No occurrences found for {} in the specified region",
                species
            ),
            FinderError::NoValidEmbeddings { species } => write!(
                f,
                "No valid embeddings found at occurrence locations for {}",
                species
            ),
            FinderError::Model(msg) => write!(f, "model error: {}", msg),
            FinderError::Shape(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for FinderError {}

impl From<ShapeError> for FinderError {
    fn from(value: ShapeError) -> Self {
        FinderError::Shape(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_shortfalls_are_distinguished_from_misuse() {
        assert!(FinderError::NoOccurrences {
            species: "x".into()
        }
        .is_insufficient_data());
        assert!(FinderError::SpeciesNotFound("x".into()).is_insufficient_data());
        assert!(!FinderError::NotFitted.is_insufficient_data());
        assert!(!FinderError::UnknownMethod("x".into()).is_insufficient_data());
    }

    #[test]
    fn insufficient_data_message() {
        let e = FinderError::InsufficientData {
            what: "classifier positives",
            required: 2,
            found: 1,
        };
        assert_eq!(
            e.to_string(),
            "classifier positives require at least 2 samples, got 1"
        );
    }
}
