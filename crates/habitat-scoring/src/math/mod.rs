//! Small dense containers and vector kernels used by the scoring methods.
//!
//! Feature matrices are row-major `Array2<f32>` with one sample per row. The
//! kernels in `vector` operate on plain row slices so they can be reused by
//! every method without copying.
pub mod matrix;
pub mod vector;

pub use matrix::{Array2, ShapeError};
