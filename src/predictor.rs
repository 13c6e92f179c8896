use crate::classifier::CategoricalClassifier;
use crate::encoder::AnswerMap;
use crate::errors::AppError;
use crate::forest::RandomForest;
use crate::storage::{ArtifactStore, TrainedClassifierArtifact};

/// Maps questionnaire answers to a label using persisted artifacts.
#[derive(Debug, Clone)]
pub struct Predictor<M> {
    artifact: TrainedClassifierArtifact<M>,
}

impl<M: CategoricalClassifier> Predictor<M> {
    /// Loads artifacts `id` from `store`; `ArtifactMissing` if training never ran.
    pub fn load<S: ArtifactStore>(store: &S, id: &str) -> Result<Self, AppError> {
        let artifact = store.load(id)?;
        Ok(Self { artifact })
    }

    pub fn from_artifact(artifact: TrainedClassifierArtifact<M>) -> Self {
        Self { artifact }
    }

    /// Labels the model can return.
    pub fn labels(&self) -> &[String] {
        self.artifact.label_encoder.classes()
    }

    pub fn question_ids(&self) -> &[String] {
        self.artifact.schema.question_ids()
    }

    /// Class probabilities keyed by label, in label order.
    pub fn predict_proba(&self, answers: &AnswerMap) -> Result<Vec<(String, f64)>, AppError> {
        let schema = &self.artifact.schema;
        schema.validate(answers)?;

        let row = schema.encode(answers);
        let proba = self.artifact.model.predict_proba(&row);
        Ok(self
            .labels()
            .iter()
            .cloned()
            .zip(proba)
            .collect())
    }

    /// Predicts a label. The answer set must name exactly the training questions.
    pub fn predict(&self, answers: &AnswerMap) -> Result<String, AppError> {
        let schema = &self.artifact.schema;
        schema.validate(answers)?;

        let row = schema.encode(answers);
        if !row.is_complete() {
            let gaps: Vec<&str> = row
                .gaps()
                .into_iter()
                .map(|i| schema.question_ids()[i].as_str())
                .collect();
            tracing::warn!(
                "Answers outside A-D for {}; predicting with those questions unanswered",
                gaps.join(", ")
            );
        }

        let class_id = self.artifact.model.predict(&row);
        let label = self
            .artifact
            .label_encoder
            .decode(class_id)
            .ok_or_else(|| {
                AppError::InternalError(format!("model produced unknown class id {}", class_id))
            })?
            .to_string();

        tracing::info!("Predicted Party: {}", label);
        Ok(label)
    }
}

/// Loads the forest artifacts fresh and predicts once.
pub fn predict_party<S: ArtifactStore>(
    store: &S,
    id: &str,
    answers: &AnswerMap,
) -> Result<String, AppError> {
    Predictor::<RandomForest>::load(store, id)?.predict(answers)
}
