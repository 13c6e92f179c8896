//! Ordinal answer encoding shared by training and prediction.
//!
//! Both paths go through [`FeatureSchema::encode`] so the alphabet and the
//! integer assignment can never drift apart.

use crate::errors::AppError;
use crate::models::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Questionnaire answers keyed by question id (`Q1`, `Q2`, ...).
pub type AnswerMap = BTreeMap<String, String>;

/// Answer tokens in code order: `A` is 0, `D` is 3.
pub const ANSWER_ALPHABET: [&str; 4] = ["A", "B", "C", "D"];

/// Code for an answer token. Matching is exact and case-sensitive; anything
/// else (lowercase, whitespace, sentinels) is a gap.
pub fn encode_answer(token: &str) -> Option<u8> {
    ANSWER_ALPHABET
        .iter()
        .position(|&letter| letter == token)
        .map(|pos| pos as u8)
}

/// One encoded questionnaire: a code per question, `None` where the answer
/// was outside the alphabet or absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedFeatureRow(Vec<Option<u8>>);

impl EncodedFeatureRow {
    pub fn new(values: Vec<Option<u8>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<u8>] {
        &self.0
    }

    /// Code of feature `idx`; out-of-range reads are gaps.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<u8> {
        self.0.get(idx).copied().flatten()
    }

    /// Positions that could not be encoded.
    pub fn gaps(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered question ids the model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    question_ids: Vec<String>,
}

impl FeatureSchema {
    pub fn new(question_ids: Vec<String>) -> Self {
        Self { question_ids }
    }

    pub fn question_ids(&self) -> &[String] {
        &self.question_ids
    }

    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    /// Fails with `SchemaMismatch` unless `answers` has exactly the schema's question ids.
    pub fn validate(&self, answers: &AnswerMap) -> Result<(), AppError> {
        let expected: BTreeSet<&str> = self.question_ids.iter().map(String::as_str).collect();
        let given: BTreeSet<&str> = answers.keys().map(String::as_str).collect();

        let missing: Vec<String> = expected
            .difference(&given)
            .map(|s| s.to_string())
            .collect();
        let unexpected: Vec<String> = given
            .difference(&expected)
            .map(|s| s.to_string())
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(AppError::SchemaMismatch {
                missing,
                unexpected,
            })
        }
    }

    /// Encodes answers in schema order. Ids absent from `answers` become gaps.
    pub fn encode(&self, answers: &AnswerMap) -> EncodedFeatureRow {
        EncodedFeatureRow(
            self.question_ids
                .iter()
                .map(|id| answers.get(id).and_then(|token| encode_answer(token)))
                .collect(),
        )
    }

    /// Encodes a survey table row, reading each question id as a column.
    pub fn encode_record(&self, record: &RawRecord) -> EncodedFeatureRow {
        EncodedFeatureRow(
            self.question_ids
                .iter()
                .map(|id| encode_answer(record.get_safe(id)))
                .collect(),
        )
    }
}

/// Bijection between label strings and class ids. Classes are sorted, so a
/// given label set always produces the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
    }

    pub fn decode(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(String::as_str)
    }

    /// Encodes every label, failing on the first one the encoder has not seen.
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, AppError> {
        labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.encode(label)
                    .ok_or_else(|| AppError::InvalidData(format!("unknown label '{}'", label)))
            })
            .collect()
    }
}
