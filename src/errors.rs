use std::fmt;
use std::path::PathBuf;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// An input table path does not exist.
    MissingSource(PathBuf),
    /// An input table exists but could not be parsed.
    UnreadableSource {
        /// Path of the table.
        path: PathBuf,
        /// Parser or I/O failure description.
        reason: String,
    },
    /// Prediction was requested before a training run persisted its artifacts.
    ArtifactMissing(String),
    /// Predictor input question ids diverge from the training schema.
    SchemaMismatch {
        /// Question ids the model was trained on but the input lacks.
        missing: Vec<String>,
        /// Question ids present in the input but unknown to the model.
        unexpected: Vec<String>,
    },
    /// Training data cannot produce a model (empty table, no labels, ...).
    InvalidData(String),
    /// Filesystem failure outside of table loading.
    Io(std::io::Error),
    /// Artifact or profile (de)serialization failure.
    Serialization(String),
    /// Internal error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingSource(path) => write!(f, "File not found: {}", path.display()),
            AppError::UnreadableSource { path, reason } => {
                write!(f, "Error reading {}: {}", path.display(), reason)
            }
            AppError::ArtifactMissing(id) => write!(
                f,
                "Trained artifacts '{}' not found; run training first",
                id
            ),
            AppError::SchemaMismatch {
                missing,
                unexpected,
            } => write!(
                f,
                "Answer schema mismatch (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            ),
            AppError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl AppError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for AppError {
    /// Converts a `std::io::Error` into an `AppError`.
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a `serde_json::Error` into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for AppError {
    /// Converts a `bincode::Error` into an `AppError`.
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for io::Error to add context
impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Io(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Io(e)),
            context: f(),
        })
    }
}
