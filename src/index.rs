//! Join structures used to attach secondary sources to a voter record.
//!
//! Built fresh for every synthesis run from already-loaded rows; nothing here
//! touches the filesystem or holds global state.

use crate::models::{ElectionContext, RawRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn area_code_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^\D*").expect("area code prefix pattern is valid"))
}

/// Strips any non-numeric prefix from an area code: `"AC112"`, `"AC 112"` and
/// `"112"` all become `"112"`.
pub fn normalize_ac_code(raw: &str) -> String {
    area_code_prefix().replace(raw.trim(), "").trim().to_string()
}

/// Keeps only the digits of a phone number so `"+91 99999-00000"` and
/// `"919999900000"` join.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Which key space satisfied an election lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElectionMatch {
    AreaCode,
    District,
    Unresolved,
}

/// Election results keyed by normalized area code, with district as fallback.
///
/// Area-code entries are last-write-wins; district entries keep the first row
/// seen for that district.
#[derive(Debug, Clone, Default)]
pub struct ElectionIndex {
    by_ac_code: HashMap<String, ElectionContext>,
    by_district: HashMap<String, ElectionContext>,
}

impl ElectionIndex {
    pub fn build(results: &[RawRecord]) -> Self {
        let mut index = Self::default();

        for row in results {
            let context = ElectionContext::from_record(row);

            let ac_key = normalize_ac_code(row.get_safe("AC No."));
            if !ac_key.is_empty() {
                index.by_ac_code.insert(ac_key, context.clone());
            }

            let district = row.get_safe("District").trim();
            if !district.is_empty() {
                index
                    .by_district
                    .entry(district.to_string())
                    .or_insert(context);
            }
        }

        tracing::debug!(
            "Election index: {} area codes, {} districts",
            index.area_code_count(),
            index.district_count()
        );
        index
    }

    /// Area code first (after stripping its prefix), then district.
    pub fn lookup(
        &self,
        ac_code: &str,
        district: &str,
    ) -> (ElectionMatch, Option<&ElectionContext>) {
        let ac_key = normalize_ac_code(ac_code);
        if let Some(ctx) = self.by_ac_code.get(&ac_key) {
            return (ElectionMatch::AreaCode, Some(ctx));
        }
        if let Some(ctx) = self.by_district.get(district.trim()) {
            return (ElectionMatch::District, Some(ctx));
        }
        (ElectionMatch::Unresolved, None)
    }

    /// Like [`lookup`](Self::lookup) but returns the all-`"Unknown"` context on a miss.
    pub fn resolve(&self, ac_code: &str, district: &str) -> ElectionContext {
        self.lookup(ac_code, district)
            .1
            .cloned()
            .unwrap_or_else(ElectionContext::unknown)
    }

    pub fn district_entry(&self, district: &str) -> Option<&ElectionContext> {
        self.by_district.get(district)
    }

    pub fn area_code_count(&self) -> usize {
        self.by_ac_code.len()
    }

    pub fn district_count(&self) -> usize {
        self.by_district.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ac_code.is_empty() && self.by_district.is_empty()
    }
}

/// All lookup structures for one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    party_members: HashMap<String, RawRecord>,
    pub elections: ElectionIndex,
}

impl LookupIndex {
    pub fn build(party_members: &[RawRecord], election_results: &[RawRecord]) -> Self {
        let mut members = HashMap::new();
        for member in party_members {
            let key = normalize_phone(member.get_safe("MobileNo"));
            if key.is_empty() {
                continue;
            }
            // a later row for the same number replaces the earlier one
            members.insert(key, member.clone());
        }

        tracing::info!(
            "Indexed {} party members and {} election results",
            members.len(),
            election_results.len()
        );

        Self {
            party_members: members,
            elections: ElectionIndex::build(election_results),
        }
    }

    /// Party-membership row for a phone number, if any.
    pub fn membership(&self, phone: &str) -> Option<&RawRecord> {
        let key = normalize_phone(phone);
        if key.is_empty() {
            return None;
        }
        self.party_members.get(&key)
    }

    pub fn member_count(&self) -> usize {
        self.party_members.len()
    }

    pub fn resolve(&self, ac_code: &str, district: &str) -> ElectionContext {
        self.elections.resolve(ac_code, district)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn election(ac: &str, district: &str, winner: &str, party: &str) -> RawRecord {
        RawRecord::from_pairs([
            ("AC No.", ac),
            ("District", district),
            ("Winning Candidate", winner),
            ("Party", party),
        ])
    }

    #[test]
    fn test_normalize_ac_code() {
        assert_eq!(normalize_ac_code("AC112"), "112");
        assert_eq!(normalize_ac_code("AC 112"), "112");
        assert_eq!(normalize_ac_code(" 112 "), "112");
        assert_eq!(normalize_ac_code("AC"), "");
        assert_eq!(normalize_ac_code(""), "");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+91 99999-00000"), "919999900000");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_area_code_wins_over_district() {
        let index = ElectionIndex::build(&[
            election("5", "Madurai", "District Winner", "P1"),
            election("112", "Chennai North", "AC Winner", "P2"),
        ]);

        let (matched, ctx) = index.lookup("AC112", "Madurai");
        assert_eq!(matched, ElectionMatch::AreaCode);
        assert_eq!(ctx.unwrap().winning_candidate, "AC Winner");
    }

    #[test]
    fn test_district_fallback_is_first_write_wins() {
        let index = ElectionIndex::build(&[
            election("10", "Salem", "First", "A"),
            election("11", "Salem", "Second", "B"),
        ]);

        assert_eq!(index.district_entry("Salem").unwrap().winning_candidate, "First");
        let ctx = index.resolve("AC999", "Salem");
        assert_eq!(ctx.winning_candidate, "First");
    }

    #[test]
    fn test_area_code_is_last_write_wins() {
        let index = ElectionIndex::build(&[
            election("10", "Salem", "First", "A"),
            election("AC10", "Erode", "Second", "B"),
        ]);
        assert_eq!(index.resolve("AC10", "").winning_candidate, "Second");
    }

    #[test]
    fn test_total_miss_is_unknown() {
        let index = ElectionIndex::build(&[election("10", "Salem", "First", "A")]);
        let (matched, ctx) = index.lookup("AC77", "Vellore");
        assert_eq!(matched, ElectionMatch::Unresolved);
        assert!(ctx.is_none());
        assert_eq!(index.resolve("AC77", "Vellore"), ElectionContext::unknown());
    }

    #[test]
    fn test_empty_area_code_never_matches() {
        let index = ElectionIndex::build(&[election("", "", "Nobody", "None")]);
        assert!(index.is_empty());
        assert_eq!(index.lookup("", "").0, ElectionMatch::Unresolved);
    }

    #[test]
    fn test_membership_excludes_blank_numbers_and_keeps_last() {
        let members = vec![
            RawRecord::from_pairs([("MobileNo", "9999"), ("Name", "old")]),
            RawRecord::from_pairs([("MobileNo", ""), ("Name", "blank")]),
            RawRecord::from_pairs([("Name", "missing")]),
            RawRecord::from_pairs([("MobileNo", "9999"), ("Name", "new")]),
        ];
        let index = LookupIndex::build(&members, &[]);

        assert_eq!(index.member_count(), 1);
        assert_eq!(index.membership("9999").unwrap().get_safe("Name"), "new");
        assert!(index.membership("").is_none());
        assert!(index.membership("1234").is_none());
    }
}
