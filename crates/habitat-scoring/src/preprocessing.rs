//! Per-dimension standardization shared by both scoring methods.
//!
//! Similarity fits the scaler on positives only; the classifier fits it on the
//! union of positives and pseudo-negatives. Both reuse the fitted transform
//! unchanged at prediction time.

use crate::error::{FinderError, Result};
use crate::math::Array2;

/// Standard scaler (per-column mean/std, population variance).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl Scaler {
    /// Columns whose spread falls below this are left unscaled.
    const MIN_STD: f32 = 1e-6;

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Same per-column scale, no centering shift.
    pub fn without_centering(&self) -> Scaler {
        Scaler {
            mean: vec![0.0; self.mean.len()],
            std: self.std.clone(),
        }
    }

    /// Standardize one row into `out`.
    #[inline]
    pub fn transform_row_into(&self, row: &[f32], out: &mut [f32]) {
        for (c, (o, &v)) in out.iter_mut().zip(row.iter()).enumerate() {
            *o = (v - self.mean[c]) / self.std[c];
        }
    }

    pub fn transform_row(&self, row: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; row.len()];
        self.transform_row_into(row, &mut out);
        out
    }
}

/// Fit a `Scaler` from an `Array2<f32>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f32>) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(FinderError::InsufficientData {
            what: "scaler fits",
            required: 1,
            found: nrows,
        });
    }

    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (m, &v) in mean.iter_mut().zip(row.iter()) {
            *m += v as f64;
        }
    }
    let nrows_f = nrows as f64;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0f64; ncols];
    for row in x.rows() {
        for c in 0..ncols {
            let d = row[c] as f64 - mean[c];
            var[c] += d * d;
        }
    }
    let std = var
        .into_iter()
        .map(|v| {
            let s = (v / nrows_f).sqrt() as f32;
            if s < Scaler::MIN_STD {
                1.0
            } else {
                s
            }
        })
        .collect();

    Ok(Scaler {
        mean: mean.into_iter().map(|m| m as f32).collect(),
        std,
    })
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f32>`.
pub fn transform_all(x: &Array2<f32>, sc: &Scaler) -> Result<Array2<f32>> {
    let (nrows, ncols) = x.shape();
    if ncols != sc.dim() {
        return Err(FinderError::DimensionMismatch {
            expected: sc.dim(),
            found: ncols,
        });
    }
    let mut out = vec![0.0f32; nrows * ncols];
    for (r, row) in x.rows().enumerate() {
        sc.transform_row_into(row, &mut out[r * ncols..(r + 1) * ncols]);
    }
    Ok(Array2::from_shape_vec((nrows, ncols), out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_scaler_computes_mean_and_std() {
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![
                1.0, 10.0,
                2.0, 20.0,
                3.0, 30.0,
                4.0, 40.0,
            ],
        )
        .unwrap();

        let sc = fit_scaler(&x).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-5, "mean[0] = {}", sc.mean[0]);
        assert!((sc.mean[1] - 25.0).abs() < 1e-5, "mean[1] = {}", sc.mean[1]);
        // population std of 1..4 is sqrt(1.25)
        assert!((sc.std[0] - 1.25f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        let x = Array2::from_shape_vec((3, 2), vec![5.0, 1.0, 5.0, 2.0, 5.0, 3.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        assert_eq!(sc.std[0], 1.0);
        let t = transform_all(&x, &sc).unwrap();
        assert!(t[(0, 0)].abs() < 1e-6);
    }

    #[test]
    fn single_row_standardizes_to_zero() {
        let x = Array2::from_shape_vec((1, 3), vec![0.3, -2.0, 7.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        let t = transform_all(&x, &sc).unwrap();
        assert!(t.as_slice().iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let x = Array2::<f32>::empty(4);
        assert!(matches!(
            fit_scaler(&x),
            Err(FinderError::InsufficientData { .. })
        ));
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let x = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        let wide = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(transform_all(&wide, &sc).is_err());
    }
}
