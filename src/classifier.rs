//! Seams between the trainer/predictor and a concrete model.
//!
//! The trainer only needs an [`Estimator`] and the predictor only needs a
//! [`CategoricalClassifier`]; swapping the random forest for another model
//! means implementing these two traits.

use crate::encoder::EncodedFeatureRow;
use crate::errors::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A fitted model that maps an encoded row to class probabilities.
pub trait CategoricalClassifier: Serialize + DeserializeOwned {
    fn n_classes(&self) -> usize;

    fn n_features(&self) -> usize;

    /// Probability per class id; sums to 1 for a well-formed model.
    fn predict_proba(&self, row: &EncodedFeatureRow) -> Vec<f64>;

    /// Most probable class id; ties go to the lowest id.
    fn predict(&self, row: &EncodedFeatureRow) -> usize {
        argmax(&self.predict_proba(row))
    }
}

/// Hyper-parameters that can fit a [`CategoricalClassifier`].
pub trait Estimator {
    type Model: CategoricalClassifier;

    /// Fits on `rows` with class ids in `0..n_classes`.
    fn fit(
        &self,
        rows: &[EncodedFeatureRow],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<Self::Model, AppError>;
}

/// Index of the first maximum (0 for an empty slice).
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}
