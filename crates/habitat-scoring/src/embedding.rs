//! Access to the per-pixel embedding raster.
//!
//! The scoring core only sees the `EmbeddingSource` trait. `EmbeddingGrid` is
//! the in-memory implementation used by the binary and the tests; pixels whose
//! feature vector is entirely zero are treated as no-data.
use crate::error::{FinderError, Result};
use crate::geo::{Coord, GeoTransform};
use crate::math::vector::is_all_zero;
use crate::math::Array2;

pub trait EmbeddingSource {
    /// `(height, width, dim)`.
    fn shape(&self) -> (usize, usize, usize);

    fn transform(&self) -> GeoTransform;

    /// Feature vector of pixel (`row`, `col`). Callers keep indices in bounds.
    fn embedding_at(&self, row: usize, col: usize) -> &[f32];

    /// Every pixel's vector, row-major over the grid (`height * width` rows).
    fn get_all_embeddings(&self) -> &Array2<f32>;

    fn pixel_to_coords(&self, row: usize, col: usize) -> Coord {
        self.transform().pixel_to_coords(row, col)
    }

    /// Containing pixel, or `None` when the coordinate falls outside the grid.
    fn coords_to_pixel(&self, c: &Coord) -> Option<(usize, usize)> {
        let (h, w, _) = self.shape();
        let (row, col) = self.transform().coords_to_fractional_pixel(c)?;
        if !row.is_finite() || !col.is_finite() || row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        if row >= h || col >= w {
            return None;
        }
        Some((row, col))
    }

    /// No-data pixels carry the all-zero sentinel vector.
    fn is_valid_pixel(&self, row: usize, col: usize) -> bool {
        !is_all_zero(self.embedding_at(row, col))
    }

    /// Vectors at each coordinate that lands on a valid pixel, plus the coordinates kept.
    fn sample_at_coords(&self, coords: &[Coord]) -> (Array2<f32>, Vec<Coord>) {
        let (_, _, dim) = self.shape();
        let mut data = Vec::with_capacity(coords.len() * dim);
        let mut valid = Vec::with_capacity(coords.len());
        for c in coords {
            let Some((row, col)) = self.coords_to_pixel(c) else {
                continue;
            };
            if !self.is_valid_pixel(row, col) {
                continue;
            }
            data.extend_from_slice(self.embedding_at(row, col));
            valid.push(*c);
        }
        let dropped = coords.len() - valid.len();
        if dropped > 0 {
            log::debug!("Dropped {} coordinates outside embedding coverage", dropped);
        }
        let n = valid.len();
        // the buffer is built row by row with exactly `dim` values each
        let vectors = Array2::from_shape_vec((n, dim), data)
            .unwrap_or_else(|_| Array2::empty(dim));
        (vectors, valid)
    }
}

/// Dense in-memory embedding raster.
#[derive(Debug, Clone)]
pub struct EmbeddingGrid {
    embeddings: Array2<f32>,
    height: usize,
    width: usize,
    transform: GeoTransform,
}

impl EmbeddingGrid {
    /// `data` is row-major `height x width x dim`.
    pub fn new(
        height: usize,
        width: usize,
        dim: usize,
        data: Vec<f32>,
        transform: GeoTransform,
    ) -> Result<Self> {
        let embeddings = Array2::from_shape_vec((height * width, dim), data)?;
        Ok(Self {
            embeddings,
            height,
            width,
            transform,
        })
    }

    /// Grid of no-data pixels, to be filled with `set_pixel`.
    pub fn empty(height: usize, width: usize, dim: usize, transform: GeoTransform) -> Self {
        Self {
            embeddings: Array2::from_shape_vec((height * width, dim), vec![0.0; height * width * dim])
                .unwrap_or_else(|_| Array2::empty(dim)),
            height,
            width,
            transform,
        }
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, values: &[f32]) -> Result<()> {
        let dim = self.embeddings.ncols();
        if values.len() != dim {
            return Err(FinderError::DimensionMismatch {
                expected: dim,
                found: values.len(),
            });
        }
        if row >= self.height || col >= self.width {
            return Err(FinderError::Shape(format!(
                "pixel ({}, {}) outside {}x{} grid",
                row, col, self.height, self.width
            )));
        }
        let idx = row * self.width + col;
        for (c, &v) in values.iter().enumerate() {
            self.embeddings[(idx, c)] = v;
        }
        Ok(())
    }

    pub fn n_valid_pixels(&self) -> usize {
        self.embeddings.rows().filter(|r| !is_all_zero(r)).count()
    }
}

impl EmbeddingSource for EmbeddingGrid {
    fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.embeddings.ncols())
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn embedding_at(&self, row: usize, col: usize) -> &[f32] {
        self.embeddings.row_slice(row * self.width + col)
    }

    fn get_all_embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::BoundingBox;

    fn grid() -> EmbeddingGrid {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 2.0);
        let t = GeoTransform::from_bounds(&bbox, 2, 4);
        let mut g = EmbeddingGrid::empty(2, 4, 2, t);
        g.set_pixel(0, 0, &[1.0, 2.0]).unwrap();
        g.set_pixel(1, 3, &[3.0, 4.0]).unwrap();
        g
    }

    #[test]
    fn sample_drops_outside_and_no_data() {
        let g = grid();
        let coords = vec![
            Coord::new(0.5, 1.5),  // pixel (0, 0)
            Coord::new(3.5, 0.5),  // pixel (1, 3)
            Coord::new(1.5, 1.5),  // no-data
            Coord::new(10.0, 1.0), // outside
        ];
        let (x, valid) = g.sample_at_coords(&coords);
        assert_eq!(x.shape(), (2, 2));
        assert_eq!(valid, vec![coords[0], coords[1]]);
        assert_eq!(x.row_slice(1), &[3.0, 4.0]);
    }

    #[test]
    fn all_embeddings_are_row_major() {
        let g = grid();
        let all = g.get_all_embeddings();
        assert_eq!(all.nrows(), 8);
        assert_eq!(all.row_slice(7), &[3.0, 4.0]);
        assert_eq!(g.n_valid_pixels(), 2);
    }

    #[test]
    fn set_pixel_checks_dimension() {
        let mut g = grid();
        assert!(matches!(
            g.set_pixel(0, 1, &[1.0]),
            Err(FinderError::DimensionMismatch { expected: 2, found: 1 })
        ));
    }
}
