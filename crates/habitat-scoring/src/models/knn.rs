//! Distance-weighted k-nearest-neighbour classifier (brute force).
//!
//! Each neighbour votes with weight `1 / distance`. When a query coincides
//! with one or more training rows, only those exact matches vote.
use std::cmp::Ordering;

use crate::error::{FinderError, Result};
use crate::math::vector::squared_euclidean;
use crate::math::Array2;
use crate::models::classifier_trait::{check_binary_labels, ClassifierModel};

pub struct KNeighborsClassifier {
    n_neighbors: usize,
    train_x: Option<Array2<f32>>,
    train_y: Vec<i32>,
}

impl KNeighborsClassifier {
    pub fn new(n_neighbors: usize) -> Self {
        KNeighborsClassifier {
            n_neighbors: n_neighbors.max(1),
            train_x: None,
            train_y: Vec::new(),
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn posterior(&self, train_x: &Array2<f32>, query: &[f32], scratch: &mut Vec<(f32, usize)>) -> f32 {
        scratch.clear();
        scratch.extend(
            train_x
                .rows()
                .enumerate()
                .map(|(i, row)| (squared_euclidean(row, query), i)),
        );

        let k = self.n_neighbors.min(scratch.len());
        let by_distance = |a: &(f32, usize), b: &(f32, usize)| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        };
        if k < scratch.len() {
            scratch.select_nth_unstable_by(k - 1, by_distance);
        }
        let neighbours = &mut scratch[..k];
        neighbours.sort_unstable_by(by_distance);

        let exact: Vec<usize> = neighbours
            .iter()
            .filter(|(d, _)| *d == 0.0)
            .map(|&(_, i)| i)
            .collect();
        if !exact.is_empty() {
            let hits = exact.iter().filter(|&&i| self.train_y[i] == 1).count();
            return hits as f32 / exact.len() as f32;
        }

        let mut positive = 0.0f64;
        let mut total = 0.0f64;
        for &(d2, i) in neighbours.iter() {
            let w = 1.0 / (d2 as f64).sqrt();
            total += w;
            if self.train_y[i] == 1 {
                positive += w;
            }
        }
        if total > 0.0 {
            (positive / total).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }
}

impl ClassifierModel for KNeighborsClassifier {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        check_binary_labels(x, y)?;
        self.train_x = Some(x.clone());
        self.train_y = y.to_vec();
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let train_x = self.train_x.as_ref().ok_or(FinderError::NotFitted)?;
        if x.ncols() != train_x.ncols() {
            return Err(FinderError::DimensionMismatch {
                expected: train_x.ncols(),
                found: x.ncols(),
            });
        }
        let mut scratch = Vec::with_capacity(train_x.nrows());
        Ok(x
            .rows()
            .map(|row| self.posterior(train_x, row, &mut scratch))
            .collect())
    }

    fn name(&self) -> &str {
        "knn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training() -> (Array2<f32>, Vec<i32>) {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0, 0.0, // class 1
                0.0, 1.0, // class 0
                1.0, 0.1, // class 1
                0.0, 0.9, // class 0
                1.1, 0.0, // class 1
                0.0, 1.2, // class 0
            ],
        )
        .expect("failed to create feature matrix");
        (x, vec![1, 0, 1, 0, 1, 0])
    }

    #[test]
    fn separable_data_is_separated() {
        let (x, y) = training();
        let mut knn = KNeighborsClassifier::new(3);
        knn.fit(&x, &y).unwrap();
        let q = Array2::from_shape_vec((2, 2), vec![0.95, 0.05, 0.05, 1.05]).unwrap();
        let p = knn.predict_proba(&q).unwrap();
        assert!(p[0] > 0.5, "{:?}", p);
        assert!(p[1] < 0.5, "{:?}", p);
    }

    #[test]
    fn exact_match_takes_the_vote() {
        let (x, y) = training();
        let mut knn = KNeighborsClassifier::new(6);
        knn.fit(&x, &y).unwrap();
        let q = Array2::from_shape_vec((1, 2), vec![0.0, 1.0]).unwrap();
        assert_eq!(knn.predict_proba(&q).unwrap(), vec![0.0]);
    }

    #[test]
    fn predict_before_fit_fails() {
        let knn = KNeighborsClassifier::new(3);
        let q = Array2::from_shape_vec((1, 2), vec![0.0, 1.0]).unwrap();
        assert_eq!(knn.predict_proba(&q), Err(FinderError::NotFitted));
    }

    #[test]
    fn single_class_is_rejected() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap();
        let mut knn = KNeighborsClassifier::new(1);
        assert!(knn.fit(&x, &[1, 1]).is_err());
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let (x, y) = training();
        let mut knn = KNeighborsClassifier::new(10);
        knn.fit(&x, &y).unwrap();
        let q = Array2::from_shape_vec((3, 2), vec![5.0, -3.0, 0.5, 0.5, -1.0, 2.0]).unwrap();
        for p in knn.predict_proba(&q).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
