//! Persona Engine Library
//!
//! This library fuses voter, party-membership, election and social-media tables
//! into synthetic individual profiles, and trains a questionnaire classifier
//! that predicts party affiliation from multiple-choice answers.
//!
//! # Modules
//!
//! - `classifier`: Estimator and classifier traits.
//! - `config`: Configuration management.
//! - `dataset`: Survey dataset loading and seeded train/test split.
//! - `encoder`: Answer, feature-schema and label encoding.
//! - `errors`: Error handling types.
//! - `forest`: Random forest of categorical decision trees.
//! - `index`: Key normalization and lookup indexes over source tables.
//! - `loader`: CSV table loading.
//! - `metrics`: Classification report.
//! - `models`: Core data models (records, profiles, election context).
//! - `pipeline`: Generation, training and prediction workflows.
//! - `predictor`: Prediction from persisted artifacts.
//! - `storage`: Artifact store backends and profile documents.
//! - `synthesizer`: Profile synthesis and behaviour policies.
//! - `trainer`: Classifier training and evaluation.

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod errors;
pub mod forest;
pub mod index;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod storage;
pub mod synthesizer;
pub mod trainer;
