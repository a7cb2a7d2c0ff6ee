//! File adapters for embedding grids, occurrence tables and run outputs.
pub mod embeddings;
pub mod occurrences;
pub mod output;

pub use embeddings::{parse_grid_shape, read_embedding_tsv};
pub use occurrences::read_occurrence_tsv;
pub use output::{
    write_candidates, write_json, write_occurrences, write_prediction, write_probability_tsv,
    GridMetadata,
};
