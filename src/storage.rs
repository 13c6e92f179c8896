use crate::classifier::CategoricalClassifier;
use crate::encoder::{FeatureSchema, LabelEncoder};
use crate::errors::{AppError, ResultExt};
use crate::models::IndividualProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Stable name under which a trained model and its encoder are stored.
pub type ArtifactId = String;

/// Fitted model plus everything needed to feed it and read its output.
/// Immutable once persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedClassifierArtifact<M> {
    pub model: M,
    pub label_encoder: LabelEncoder,
    pub schema: FeatureSchema,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncoderBlob {
    label_encoder: LabelEncoder,
    schema: FeatureSchema,
}

/// Persists trained artifacts as two named blobs (model, encoder).
pub trait ArtifactStore {
    fn save<M: CategoricalClassifier>(
        &self,
        id: &str,
        artifact: &TrainedClassifierArtifact<M>,
    ) -> Result<ArtifactId, AppError>;

    /// Fails with `ArtifactMissing` when no training run has saved `id`.
    fn load<M: CategoricalClassifier>(
        &self,
        id: &str,
    ) -> Result<TrainedClassifierArtifact<M>, AppError>;
}

fn to_blobs<M: CategoricalClassifier>(
    artifact: &TrainedClassifierArtifact<M>,
) -> Result<(Vec<u8>, Vec<u8>), AppError> {
    let model = bincode::serialize(&artifact.model)?;
    let encoder = serde_json::to_vec_pretty(&EncoderBlob {
        label_encoder: artifact.label_encoder.clone(),
        schema: artifact.schema.clone(),
    })?;
    Ok((model, encoder))
}

fn from_blobs<M: CategoricalClassifier>(
    model: &[u8],
    encoder: &[u8],
) -> Result<TrainedClassifierArtifact<M>, AppError> {
    let model: M = bincode::deserialize(model)?;
    let EncoderBlob {
        label_encoder,
        schema,
    } = serde_json::from_slice(encoder)?;

    if model.n_classes() != label_encoder.n_classes() || model.n_features() != schema.len() {
        return Err(AppError::Serialization(format!(
            "model ({} classes, {} features) does not match encoder ({} classes, {} questions)",
            model.n_classes(),
            model.n_features(),
            label_encoder.n_classes(),
            schema.len()
        )));
    }

    Ok(TrainedClassifierArtifact {
        model,
        label_encoder,
        schema,
    })
}

/// Stores artifacts as `<dir>/<id>_predictor.bin` and `<dir>/<id>_encoder.json`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn model_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}_predictor.bin", id))
    }

    pub fn encoder_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}_encoder.json", id))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            tracing::debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save<M: CategoricalClassifier>(
        &self,
        id: &str,
        artifact: &TrainedClassifierArtifact<M>,
    ) -> Result<ArtifactId, AppError> {
        let (model, encoder) = to_blobs(artifact)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let model_path = self.model_path(id);
        let encoder_path = self.encoder_path(id);
        let model_tmp = tmp_path(&model_path);
        let encoder_tmp = tmp_path(&encoder_path);

        let staged = fs::write(&model_tmp, &model)
            .and_then(|_| fs::write(&encoder_tmp, &encoder))
            .and_then(|_| fs::rename(&model_tmp, &model_path));
        if let Err(e) = staged {
            // the previous pair, if any, is still intact
            discard(&[model_tmp.as_path(), encoder_tmp.as_path()]);
            return Err::<ArtifactId, _>(e)
                .with_context(|| format!("Failed to persist artifacts '{}'", id));
        }

        if let Err(e) = fs::rename(&encoder_tmp, &encoder_path) {
            // new model next to the old encoder is not a valid pair
            discard(&[encoder_tmp.as_path(), model_path.as_path()]);
            return Err::<ArtifactId, _>(e)
                .with_context(|| format!("Failed to persist artifacts '{}'", id));
        }

        tracing::info!(
            "Saved artifacts '{}' to {} and {}",
            id,
            model_path.display(),
            encoder_path.display()
        );
        Ok(id.to_string())
    }

    fn load<M: CategoricalClassifier>(
        &self,
        id: &str,
    ) -> Result<TrainedClassifierArtifact<M>, AppError> {
        let model_path = self.model_path(id);
        let encoder_path = self.encoder_path(id);
        if !model_path.exists() || !encoder_path.exists() {
            return Err(AppError::ArtifactMissing(id.to_string()));
        }

        let model = fs::read(&model_path)
            .with_context(|| format!("Failed to read {}", model_path.display()))?;
        let encoder = fs::read(&encoder_path)
            .with_context(|| format!("Failed to read {}", encoder_path.display()))?;

        from_blobs(&model, &encoder).with_context(|| format!("Corrupt artifacts '{}'", id))
    }
}

/// In-process store; each `load` deserializes a fresh copy.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<HashMap<String, (Vec<u8>, Vec<u8>)>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalError("artifact store lock poisoned".to_string())
}

impl ArtifactStore for MemoryArtifactStore {
    fn save<M: CategoricalClassifier>(
        &self,
        id: &str,
        artifact: &TrainedClassifierArtifact<M>,
    ) -> Result<ArtifactId, AppError> {
        let blobs = to_blobs(artifact)?;
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(id.to_string(), blobs);
        Ok(id.to_string())
    }

    fn load<M: CategoricalClassifier>(
        &self,
        id: &str,
    ) -> Result<TrainedClassifierArtifact<M>, AppError> {
        let guard = self.blobs.read().map_err(poisoned)?;
        let (model, encoder) = guard
            .get(id)
            .ok_or_else(|| AppError::ArtifactMissing(id.to_string()))?;
        from_blobs(model, encoder)
    }
}

// ============ Profile documents ============

/// Writes profiles as a pretty-printed JSON array (4-space indent).
pub fn write_profiles(path: &Path, profiles: &[IndividualProfile]) -> Result<(), AppError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    profiles.serialize(&mut serializer)?;

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&buf)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_profiles(path: &Path) -> Result<Vec<IndividualProfile>, AppError> {
    if !path.exists() {
        return Err(AppError::MissingSource(path.to_path_buf()));
    }
    let content =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_slice(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Estimator;
    use crate::encoder::EncodedFeatureRow;
    use crate::forest::{ForestParams, RandomForest};

    fn artifact() -> TrainedClassifierArtifact<RandomForest> {
        let rows = vec![
            EncodedFeatureRow::new(vec![Some(0), Some(1)]),
            EncodedFeatureRow::new(vec![Some(3), Some(2)]),
        ];
        let params = ForestParams {
            n_estimators: 3,
            ..ForestParams::default()
        };
        TrainedClassifierArtifact {
            model: params.fit(&rows, &[0, 1], 2).unwrap(),
            label_encoder: LabelEncoder::fit(["ADMK", "DMK"]),
            schema: FeatureSchema::new(vec!["Q1".to_string(), "Q2".to_string()]),
        }
    }

    #[test]
    fn test_fs_store_missing_is_artifact_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let result = store.load::<RandomForest>("party");
        assert!(matches!(result, Err(AppError::ArtifactMissing(id)) if id == "party"));
    }

    #[test]
    fn test_fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("models"));
        let original = artifact();

        let id = store.save("party", &original).unwrap();
        assert!(store.model_path(&id).exists());
        assert!(store.encoder_path(&id).exists());
        assert!(!tmp_path(&store.model_path(&id)).exists());

        let loaded: TrainedClassifierArtifact<RandomForest> = store.load(&id).unwrap();
        assert_eq!(to_blobs(&loaded).unwrap(), to_blobs(&original).unwrap());
    }

    #[test]
    fn test_failed_resave_keeps_previous_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let original = artifact();
        store.save("party", &original).unwrap();

        // a directory in the way of the staged encoder makes the second save fail
        fs::create_dir(tmp_path(&store.encoder_path("party"))).unwrap();
        let mut retrained = artifact();
        retrained.label_encoder = LabelEncoder::fit(["BJP", "NTK"]);
        assert!(store.save("party", &retrained).is_err());

        assert!(store.model_path("party").exists());
        assert!(!tmp_path(&store.model_path("party")).exists());
        let loaded = store.load::<RandomForest>("party").unwrap();
        assert_eq!(to_blobs(&loaded).unwrap(), to_blobs(&original).unwrap());
        assert_eq!(loaded.label_encoder.classes(), &["ADMK", "DMK"]);
    }

    #[test]
    fn test_fs_store_rejects_mismatched_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let mut original = artifact();
        original.label_encoder = LabelEncoder::fit(["ADMK", "BJP", "DMK"]);

        store.save("party", &original).unwrap();
        let err = store.load::<RandomForest>("party").unwrap_err();
        assert!(matches!(err.root(), AppError::Serialization(_)));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryArtifactStore::new();
        assert!(matches!(
            store.load::<RandomForest>("party"),
            Err(AppError::ArtifactMissing(_))
        ));

        let original = artifact();
        store.save("party", &original).unwrap();
        let loaded = store.load::<RandomForest>("party").unwrap();
        assert_eq!(to_blobs(&loaded).unwrap(), to_blobs(&original).unwrap());
    }
}
