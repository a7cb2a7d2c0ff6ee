use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2 as NdArray2};

use crate::error::{FinderError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{check_binary_labels, ClassifierModel};

/// L2-regularised logistic regression backed by `linfa-logistic`.
///
/// Used by the validation harness, where stable probability estimates matter
/// more than flexibility.
pub struct LogisticRegressionModel {
    max_iterations: u64,
    model: Option<FittedLogisticRegression<f64, bool>>,
}

impl LogisticRegressionModel {
    pub fn new(max_iterations: u64) -> Self {
        LogisticRegressionModel {
            max_iterations,
            model: None,
        }
    }
}

fn to_ndarray(x: &Array2<f32>) -> Result<NdArray2<f64>> {
    NdArray2::from_shape_vec(x.shape(), x.as_slice().iter().map(|&v| v as f64).collect())
        .map_err(|e| FinderError::Shape(e.to_string()))
}

impl ClassifierModel for LogisticRegressionModel {
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()> {
        check_binary_labels(x, y)?;

        let records = to_ndarray(x)?;
        let targets = Array1::from_iter(y.iter().map(|&l| l == 1));
        let dataset = Dataset::new(records, targets);

        let fitted = LogisticRegression::default()
            .max_iterations(self.max_iterations)
            .fit(&dataset)
            .map_err(|e| FinderError::Model(e.to_string()))?;

        log::trace!(
            "Fitted logistic regression on {} rows ({} features)",
            x.nrows(),
            x.ncols()
        );
        self.model = Some(fitted);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        let model = self.model.as_ref().ok_or(FinderError::NotFitted)?;
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let records = to_ndarray(x)?;
        // linfa reports the probability of its positive class, which is the
        // more frequent label in the training targets
        let positive_is_presence = model.labels().pos.class;
        let probs = model.predict_probabilities(&records);
        Ok(probs
            .iter()
            .map(|&p| {
                let p = if positive_is_presence { p } else { 1.0 - p };
                p.clamp(0.0, 1.0) as f32
            })
            .collect())
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
