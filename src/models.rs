use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============ Input Records ============

/// One row of an input table: column name to raw string value.
///
/// No type coercion happens at load time. Reads go through [`RawRecord::get_safe`]
/// or [`RawRecord::get_or`], which treat an absent column and an empty value alike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    /// Builds a record from `(column, value)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `column`, or `""` when the column is absent or empty.
    pub fn get_safe(&self, column: &str) -> &str {
        self.get_or(column, "")
    }

    /// Value of `column`, or `default` when the column is absent or empty.
    pub fn get_or<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        match self.fields.get(column) {
            Some(value) if !value.is_empty() => value.as_str(),
            _ => default,
        }
    }
}

// ============ Synthesized Profile ============

/// The synthesized per-person document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualProfile {
    pub demographics: Demographics,
    pub political_identity: PoliticalIdentity,
    pub digital_behavior: DigitalBehavior,
    pub geographic_context: GeographicContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: String,
    pub gender: String,
    /// `"{street}, {district}, {ac_no}"`.
    pub location: String,
    /// `"{relation} of {relative}"`, or `"Head of Family"` when no relative is recorded.
    pub family_status: String,
    /// Area code as it appears in the voter roll (prefix intact).
    pub ac_no: String,
    pub district: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliticalIdentity {
    pub party_member: String,
    pub constituency_history: String,
    pub engagement_level: EngagementLevel,
}

/// Coarse engagement tier derived from questionnaire flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    /// `High` when the membership questionnaire was completed, `Medium` when only
    /// the family questionnaire was, `Low` otherwise. Flags compare against the
    /// literal `"TRUE"`.
    pub fn from_flags(membership_questionnaire: &str, family_questionnaire: &str) -> Self {
        if membership_questionnaire == "TRUE" {
            EngagementLevel::High
        } else if family_questionnaire == "TRUE" {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementLevel::High => "High",
            EngagementLevel::Medium => "Medium",
            EngagementLevel::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalBehavior {
    pub content_preferences: String,
    pub engagement_patterns: String,
    pub emotional_tendencies: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicContext {
    pub booth_number: String,
    pub constituency: String,
    pub local_issues: String,
}

// ============ Join Results ============

/// Prior election outcome resolved for an individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionContext {
    pub ac_no: String,
    pub district: String,
    pub winning_candidate: String,
    pub party: String,
}

impl ElectionContext {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Context returned when neither the area code nor the district resolves.
    pub fn unknown() -> Self {
        Self {
            ac_no: Self::UNKNOWN.to_string(),
            district: Self::UNKNOWN.to_string(),
            winning_candidate: Self::UNKNOWN.to_string(),
            party: Self::UNKNOWN.to_string(),
        }
    }

    /// Reads an election-results row (`AC No.`, `District`, `Winning Candidate`, `Party`).
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            ac_no: record.get_or("AC No.", Self::UNKNOWN).trim().to_string(),
            district: record.get_or("District", Self::UNKNOWN).trim().to_string(),
            winning_candidate: record
                .get_or("Winning Candidate", Self::UNKNOWN)
                .to_string(),
            party: record.get_or("Party", Self::UNKNOWN).to_string(),
        }
    }

    /// `"District: {district}. Winner: {candidate} ({party})"` using the voter's district.
    pub fn history_for(&self, district: &str) -> String {
        format!(
            "District: {}. Winner: {} ({})",
            district, self.winning_candidate, self.party
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_safe_defaults_absent_and_empty() {
        let record = RawRecord::from_pairs([("age", "42"), ("gender", "")]);
        assert_eq!(record.get_safe("age"), "42");
        assert_eq!(record.get_safe("gender"), "");
        assert_eq!(record.get_safe("street_name"), "");
        assert_eq!(record.get_or("gender", "unknown"), "unknown");
        assert_eq!(record.get_or("likes", "0"), "0");
    }

    #[test]
    fn test_engagement_level_flags_are_case_sensitive() {
        assert_eq!(EngagementLevel::from_flags("TRUE", "TRUE"), EngagementLevel::High);
        assert_eq!(EngagementLevel::from_flags("FALSE", "TRUE"), EngagementLevel::Medium);
        assert_eq!(EngagementLevel::from_flags("true", "true"), EngagementLevel::Low);
        assert_eq!(EngagementLevel::from_flags("", ""), EngagementLevel::Low);
    }

    #[test]
    fn test_engagement_level_serializes_as_label() {
        let json = serde_json::to_string(&EngagementLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }

    #[test]
    fn test_election_context_from_partial_row() {
        let record = RawRecord::from_pairs([("AC No.", " 112 "), ("Winning Candidate", "X")]);
        let ctx = ElectionContext::from_record(&record);
        assert_eq!(ctx.ac_no, "112");
        assert_eq!(ctx.winning_candidate, "X");
        assert_eq!(ctx.party, "Unknown");
        assert_eq!(
            ctx.history_for("Chennai North"),
            "District: Chennai North. Winner: X (Unknown)"
        );
    }
}
