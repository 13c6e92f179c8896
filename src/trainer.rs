use crate::classifier::{CategoricalClassifier, Estimator};
use crate::dataset::{train_test_split, SurveyDataset};
use crate::encoder::{EncodedFeatureRow, LabelEncoder};
use crate::errors::{AppError, ResultExt};
use crate::metrics::ClassificationReport;
use crate::storage::{ArtifactStore, TrainedClassifierArtifact};

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome<M> {
    pub artifact: TrainedClassifierArtifact<M>,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fits an [`Estimator`] on a survey with a seeded held-out evaluation split.
#[derive(Debug, Clone)]
pub struct Trainer<E> {
    estimator: E,
    test_size: f64,
    split_seed: u64,
}

impl<E: Estimator> Trainer<E> {
    /// Holds out 20% of rows, split with seed 42.
    pub fn new(estimator: E) -> Self {
        Self {
            estimator,
            test_size: 0.2,
            split_seed: 42,
        }
    }

    pub fn with_split(mut self, test_size: f64, split_seed: u64) -> Self {
        self.test_size = test_size;
        self.split_seed = split_seed;
        self
    }

    pub fn train(&self, dataset: &SurveyDataset) -> Result<TrainingOutcome<E::Model>, AppError> {
        if dataset.is_empty() {
            return Err(AppError::InvalidData(
                "survey contains no labelled rows".to_string(),
            ));
        }

        let label_encoder = LabelEncoder::fit(&dataset.labels);
        let class_ids = label_encoder.transform(&dataset.labels)?;
        tracing::info!(
            "Training on {} rows, {} questions, {} classes: {}",
            dataset.len(),
            dataset.schema.len(),
            label_encoder.n_classes(),
            label_encoder.classes().join(", ")
        );

        let split = train_test_split(dataset.len(), self.test_size, self.split_seed)?;
        let select = |indices: &[usize]| -> (Vec<EncodedFeatureRow>, Vec<usize>) {
            indices
                .iter()
                .map(|&i| (dataset.rows[i].clone(), class_ids[i]))
                .unzip()
        };
        let (train_x, train_y) = select(&split.train);
        let (test_x, test_y) = select(&split.test);

        let model = self
            .estimator
            .fit(&train_x, &train_y, label_encoder.n_classes())
            .context("Model fitting failed")?;

        let predictions: Vec<usize> = test_x.iter().map(|row| model.predict(row)).collect();
        let report = ClassificationReport::new(&test_y, &predictions, label_encoder.classes());
        tracing::info!(
            "Evaluation on {} held-out rows (accuracy {:.2}):\n{}",
            test_x.len(),
            report.accuracy,
            report
        );

        Ok(TrainingOutcome {
            artifact: TrainedClassifierArtifact {
                model,
                label_encoder,
                schema: dataset.schema.clone(),
            },
            report,
            train_rows: train_x.len(),
            test_rows: test_x.len(),
        })
    }

    /// Trains and saves both artifacts under `id`. Nothing is saved if training fails.
    pub fn train_and_persist<S: ArtifactStore>(
        &self,
        dataset: &SurveyDataset,
        store: &S,
        id: &str,
    ) -> Result<TrainingOutcome<E::Model>, AppError> {
        let outcome = self.train(dataset)?;
        store
            .save(id, &outcome.artifact)
            .with_context(|| format!("Failed to save artifacts '{}'", id))?;
        Ok(outcome)
    }
}
