//! Random forest over ordinal-coded categorical features.
//!
//! Each member is a `linfa-trees` decision tree fitted on a bootstrap sample
//! of the training rows. Answer codes `0..=3` are fed to the trees as-is and a
//! missing answer takes the reserved code [`MISSING_CODE`], so a gap is a
//! value the trees can split on rather than a hole in the matrix.

use crate::classifier::{CategoricalClassifier, Estimator};
use crate::encoder::EncodedFeatureRow;
use crate::errors::AppError;
use linfa::traits::{Fit, PredictInplace};
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Feature value standing in for a missing answer, one past the last letter code.
pub const MISSING_CODE: f64 = 4.0;

// =============================================================================
// Parameters
// =============================================================================

/// Random forest hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees.
    pub n_estimators: usize,
    /// Maximum tree depth (`None` grows until leaves are pure).
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum samples per child.
    pub min_samples_leaf: usize,
    /// Draw each tree's rows with replacement.
    pub bootstrap: bool,
    /// Seeds every random choice made while fitting.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

// =============================================================================
// Feature matrix
// =============================================================================

/// Numeric view of an encoded row; gaps become [`MISSING_CODE`].
pub fn feature_values(row: &EncodedFeatureRow) -> Vec<f64> {
    row.values()
        .iter()
        .map(|code| code.map_or(MISSING_CODE, f64::from))
        .collect()
}

fn feature_matrix<'a, I>(
    rows: I,
    n_rows: usize,
    n_features: usize,
) -> Result<Array2<f64>, AppError>
where
    I: IntoIterator<Item = &'a EncodedFeatureRow>,
{
    let data: Vec<f64> = rows.into_iter().flat_map(feature_values).collect();
    Array2::from_shape_vec((n_rows, n_features), data)
        .map_err(|e| AppError::InvalidData(format!("Failed to shape feature matrix: {}", e)))
}

// =============================================================================
// Forest
// =============================================================================

/// A fitted forest. Class probabilities are the share of trees voting for each class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree<f64, usize>>,
}

impl CategoricalClassifier for RandomForest {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, row: &EncodedFeatureRow) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        if self.trees.is_empty() || row.len() != self.n_features {
            return proba;
        }
        let x = match feature_matrix([row], 1, self.n_features) {
            Ok(x) => x,
            Err(_) => return proba,
        };

        let mut voted = Array1::<usize>::zeros(1);
        for tree in &self.trees {
            tree.predict_inplace(&x, &mut voted);
            if let Some(p) = proba.get_mut(voted[0]) {
                *p += 1.0;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        proba
    }
}

impl Estimator for ForestParams {
    type Model = RandomForest;

    fn fit(
        &self,
        rows: &[EncodedFeatureRow],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<RandomForest, AppError> {
        if rows.is_empty() {
            return Err(AppError::InvalidData("no training rows".to_string()));
        }
        if rows.len() != labels.len() {
            return Err(AppError::InvalidData(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        if self.n_estimators == 0 {
            return Err(AppError::InvalidData(
                "n_estimators must be positive".to_string(),
            ));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(AppError::InvalidData(format!(
                "class id {} out of range for {} classes",
                bad, n_classes
            )));
        }

        let n_features = rows[0].len();
        if rows.iter().any(|r| r.len() != n_features) {
            return Err(AppError::InvalidData(
                "training rows have differing widths".to_string(),
            ));
        }

        let n = rows.len();
        let mut seeds = ChaCha8Rng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let mut rng = ChaCha8Rng::seed_from_u64(seeds.gen());
            let samples: Vec<usize> = if self.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };

            let records = feature_matrix(samples.iter().map(|&i| &rows[i]), n, n_features)?;
            let targets: Array1<usize> = samples.iter().map(|&i| labels[i]).collect();
            let dataset = Dataset::new(records, targets);

            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(self.max_depth)
                .min_weight_split(self.min_samples_split as f32)
                .min_weight_leaf(self.min_samples_leaf as f32)
                .fit(&dataset)
                .map_err(|e| {
                    AppError::InternalError(format!("Decision tree fit failed: {}", e))
                })?;
            trees.push(tree);
        }

        Ok(RandomForest {
            n_features,
            n_classes,
            trees,
        })
    }
}
