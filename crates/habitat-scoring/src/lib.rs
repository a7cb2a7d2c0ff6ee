//! Habitat scoring from per-pixel environmental embeddings.
//!
//! Given the locations where a species has been recorded, this crate scores
//! every pixel of an embedding grid by how much it resembles those locations.
//! Two methods are provided: centroid similarity for data-deficient species
//! and a KNN classifier trained against pseudo-negative background points.
//! A validation harness measures how discrimination (AUC) grows with the
//! number of training positives.
//!
//! The scoring core is single-threaded and takes every random generator
//! explicitly, so seeded runs are reproducible.
pub mod config;
pub mod embedding;
pub mod error;
pub mod geo;
pub mod geojson;
pub mod io;
pub mod math;
pub mod methods;
pub mod models;
pub mod occurrence;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod sampling;
pub mod stats;
pub mod validation;

pub use error::{FinderError, Result};
