//! Historical survey table used to train the classifier.
use crate::encoder::{EncodedFeatureRow, FeatureSchema};
use crate::errors::AppError;
use crate::loader::{load_table, Table};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Encoded survey answers with their labels.
#[derive(Debug, Clone)]
pub struct SurveyDataset {
    pub schema: FeatureSchema,
    pub rows: Vec<EncodedFeatureRow>,
    pub labels: Vec<String>,
}

impl SurveyDataset {
    /// Loads and encodes a survey CSV. Every column except `label_column` is a question.
    pub fn load(path: &Path, label_column: &str) -> Result<Self, AppError> {
        let table = load_table(path)?;
        Self::from_table(&table, label_column)
    }

    pub fn from_table(table: &Table, label_column: &str) -> Result<Self, AppError> {
        if !table.headers.iter().any(|h| h == label_column) {
            return Err(AppError::InvalidData(format!(
                "label column '{}' not found in survey header",
                label_column
            )));
        }

        let schema = FeatureSchema::new(
            table
                .headers
                .iter()
                .filter(|h| h.as_str() != label_column)
                .cloned()
                .collect(),
        );
        if schema.is_empty() {
            return Err(AppError::InvalidData(
                "survey has no question columns".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(table.records.len());
        let mut labels = Vec::with_capacity(table.records.len());
        let mut skipped = 0usize;
        let mut incomplete = 0usize;

        for record in &table.records {
            let label = record.get_safe(label_column).trim();
            if label.is_empty() {
                skipped += 1;
                continue;
            }
            let row = schema.encode_record(record);
            if !row.is_complete() {
                incomplete += 1;
            }
            rows.push(row);
            labels.push(label.to_string());
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} survey rows without a '{}' label", skipped, label_column);
        }
        if incomplete > 0 {
            tracing::warn!(
                "{} survey rows contain answers outside A-D; those cells are left empty",
                incomplete
            );
        }

        Ok(Self {
            schema,
            rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn incomplete_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_complete()).count()
    }
}

/// Row indices of a train/evaluation partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with a seeded generator and holds out `ceil(test_size * n)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<SplitIndices, AppError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::InvalidData(format!(
            "test size must be between 0 and 1, got {}",
            test_size
        )));
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::InvalidData(format!(
            "cannot split {} rows with test size {}",
            n, test_size
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(SplitIndices { train, test: order })
}
