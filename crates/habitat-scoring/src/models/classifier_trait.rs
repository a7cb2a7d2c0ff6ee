use crate::error::Result;
use crate::math::Array2;

/// Binary discriminator contract shared by the neighbour classifier and the
/// logistic model used for validation.
pub trait ClassifierModel {
    /// Fit the model. `y` uses 1 for positives and 0 for negatives.
    fn fit(&mut self, x: &Array2<f32>, y: &[i32]) -> Result<()>;

    /// Posterior probability of the positive class for each row, in [0, 1].
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Reject label vectors that do not match `x` or contain a single class.
pub(crate) fn check_binary_labels(x: &Array2<f32>, y: &[i32]) -> Result<(usize, usize)> {
    use crate::error::FinderError;

    if x.nrows() != y.len() {
        return Err(FinderError::Shape(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    let n_pos = y.iter().filter(|&&l| l == 1).count();
    let n_neg = y.len() - n_pos;
    if n_pos == 0 {
        return Err(FinderError::InsufficientData {
            what: "positive training rows",
            required: 1,
            found: 0,
        });
    }
    if n_neg == 0 {
        return Err(FinderError::InsufficientData {
            what: "negative training rows",
            required: 1,
            found: 0,
        });
    }
    Ok((n_pos, n_neg))
}
