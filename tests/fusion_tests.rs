//! End-to-end profile fusion over CSV fixtures.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_persona_engine::config::Config;
use rust_persona_engine::index::{ElectionMatch, LookupIndex};
use rust_persona_engine::loader::load_csv;
use rust_persona_engine::models::{DigitalBehavior, EngagementLevel, RawRecord};
use rust_persona_engine::pipeline::{generate_profiles, run_profile_generation, SourceTables};
use rust_persona_engine::storage::read_profiles;
use rust_persona_engine::synthesizer::{BehaviorPolicy, BehaviorSource, ProfileSynthesizer};
use std::fs;
use std::path::Path;

const VOTERS: &str = "\
phoneNumber,ac_no,district,age,gender,street_name,relation_ship,relative,party_member,is_party_member_renewed,membership_questionnaire,family_questionnaire,booth_no,consituency_number
9000000001,112,Chennai North,42,F,Anna Salai,Wife,Kumar,Yes,TRUE,TRUE,FALSE,17,8
9000000002,AC999,Madurai,35,M,Gandhi St,,,No,FALSE,FALSE,TRUE,3,2
9000000003,AC500,Nowhere,61,M,Lake Rd,Son,Raman,No,FALSE,false,false,9,1
";

const ELECTION_RESULTS: &str = "\
AC No.,District,Winning Candidate,Party
AC112,Chennai North,X,Y
AC200,Madurai,First Winner,P1
AC201,Madurai,Second Winner,P2
";

const PARTY_MEMBERS: &str = "\
MobileNo,Name
90000 00001,Member One
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "oraniyil_tn.csv", VOTERS);
    write(dir.path(), "election_result.csv", ELECTION_RESULTS);
    write(dir.path(), "DMK-party-Membership.csv", PARTY_MEMBERS);
    dir
}

#[cfg(test)]
mod fusion_tests {
    use super::*;

    #[test]
    fn area_code_prefix_does_not_block_the_join() {
        let dir = fixture_dir();
        let config = Config::with_data_dir(dir.path());
        let tables = SourceTables::load(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let (profiles, report) = generate_profiles(&tables, BehaviorPolicy::default(), &mut rng);

        assert_eq!(profiles.len(), 3);
        assert_eq!(
            profiles[0].political_identity.constituency_history,
            "District: Chennai North. Winner: X (Y)"
        );
        assert_eq!(report.election_by_area_code, 1);
        assert_eq!(report.election_by_district, 1);
        assert_eq!(report.election_unresolved, 1);
        assert_eq!(report.membership_matches, 1);
    }

    #[test]
    fn district_fallback_keeps_first_row() {
        let dir = fixture_dir();
        let results = load_csv(&dir.path().join("election_result.csv"));
        let index = LookupIndex::build(&[], &results);

        let (matched, context) = index.elections.lookup("AC999", "Madurai");
        assert_eq!(matched, ElectionMatch::District);
        let context = context.unwrap();
        assert_eq!(context.winning_candidate, "First Winner");
        assert_eq!(context.party, "P1");
    }

    #[test]
    fn area_code_takes_precedence_over_district() {
        let results = vec![
            RawRecord::from_pairs([
                ("AC No.", "AC7"),
                ("District", "Salem"),
                ("Winning Candidate", "District Row"),
                ("Party", "P1"),
            ]),
            RawRecord::from_pairs([
                ("AC No.", "AC8"),
                ("District", "Erode"),
                ("Winning Candidate", "Code Row"),
                ("Party", "P2"),
            ]),
        ];
        let index = LookupIndex::build(&[], &results);

        let (matched, context) = index.elections.lookup("8", "Salem");
        assert_eq!(matched, ElectionMatch::AreaCode);
        assert_eq!(context.unwrap().winning_candidate, "Code Row");
    }

    #[test]
    fn unresolved_election_renders_unknown() {
        let dir = fixture_dir();
        let config = Config::with_data_dir(dir.path());
        let tables = SourceTables::load(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let (profiles, _) = generate_profiles(&tables, BehaviorPolicy::default(), &mut rng);
        assert_eq!(
            profiles[2].political_identity.constituency_history,
            "District: Nowhere. Winner: Unknown (Unknown)"
        );
    }

    #[test]
    fn demographic_and_geographic_templates() {
        let dir = fixture_dir();
        let config = Config::with_data_dir(dir.path());
        let tables = SourceTables::load(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let (profiles, _) = generate_profiles(&tables, BehaviorPolicy::default(), &mut rng);

        let first = &profiles[0];
        assert_eq!(first.demographics.location, "Anna Salai, Chennai North, 112");
        assert_eq!(first.demographics.family_status, "Wife of Kumar");
        assert_eq!(first.political_identity.party_member, "Yes (Renewed: TRUE)");
        assert_eq!(first.political_identity.engagement_level, EngagementLevel::High);
        assert_eq!(first.geographic_context.constituency, "112 - 8");
        assert_eq!(first.geographic_context.booth_number, "17");
        assert_eq!(
            first.geographic_context.local_issues,
            "Inferred from Chennai North context"
        );

        let second = &profiles[1];
        assert_eq!(second.demographics.family_status, "Head of Family");
        assert_eq!(second.political_identity.engagement_level, EngagementLevel::Medium);

        // Lowercase flags do not count
        let third = &profiles[2];
        assert_eq!(third.political_identity.engagement_level, EngagementLevel::Low);
    }

    #[test]
    fn empty_pools_always_yield_passive_behavior() {
        let dir = fixture_dir();
        let config = Config::with_data_dir(dir.path());
        let tables = SourceTables::load(&config);

        for policy in [BehaviorPolicy::default(), BehaviorPolicy::normalized()] {
            let mut rng = ChaCha8Rng::seed_from_u64(4);
            let (profiles, report) = generate_profiles(&tables, policy, &mut rng);
            assert_eq!(report.default_behaviors, profiles.len());
            assert!(profiles
                .iter()
                .all(|p| p.digital_behavior == DigitalBehavior::passive()));
        }
    }

    #[test]
    fn influencer_with_no_reactions_is_dominated_by_like() {
        let influencer = RawRecord::from_pairs([
            ("party", "DMK"),
            ("like_count", "0"),
            ("love_count", "0"),
            ("angry_count", "0"),
            ("haha_count", "0"),
        ]);
        let behavior = DigitalBehavior::from_influencer(&influencer);
        assert_eq!(behavior.emotional_tendencies, "Dominant reaction: like");
        assert_eq!(
            behavior.content_preferences,
            "Engages with DMK content. Media type pref: mixed"
        );
        assert_eq!(
            behavior.engagement_patterns,
            "Reacts frequently. Total reactions: 0"
        );
    }

    #[test]
    fn seeded_replay_reproduces_behavior_source() {
        let voters = vec![RawRecord::from_pairs([("phoneNumber", "1")]); 40];
        let volunteers = vec![RawRecord::from_pairs([("campaignName", "Youth")])];
        let influencers = vec![RawRecord::from_pairs([("party", "DMK")])];
        let index = LookupIndex::build(&[], &[]);
        let synthesizer = ProfileSynthesizer::new(&index, &volunteers, &influencers);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let (profiles, _) = synthesizer.synthesize_all(&voters, &mut rng);

        let mut replay = ChaCha8Rng::seed_from_u64(11);
        for profile in &profiles {
            // the policy draw alone predicts the category of the full block
            let source = synthesizer
                .policy()
                .draw(&mut replay.clone(), true, true);
            let behavior = synthesizer.draw_behavior(&mut replay);

            assert_eq!(behavior, profile.digital_behavior);
            assert_eq!(behavior.source(), source);
        }
        assert!(profiles
            .iter()
            .any(|p| p.digital_behavior.source() != BehaviorSource::Default));
    }

    #[test]
    fn volunteer_without_counts_renders_defaults() {
        let voters = vec![RawRecord::from_pairs([("phoneNumber", "1")]); 40];
        let volunteers = vec![RawRecord::from_pairs([
            ("campaignName", ""),
            ("hashtags", "#TNVotes"),
        ])];
        let index = LookupIndex::build(&[], &[]);
        let synthesizer = ProfileSynthesizer::new(&index, &volunteers, &[]);

        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let (profiles, report) = synthesizer.synthesize_all(&voters, &mut rng);
        assert!(report.volunteer_behaviors > 0);

        for profile in &profiles {
            let behavior = &profile.digital_behavior;
            if behavior.source() == BehaviorSource::Volunteer {
                assert_eq!(
                    behavior.content_preferences,
                    "Interested in general campaigns, hashtags: #TNVotes"
                );
                assert_eq!(
                    behavior.engagement_patterns,
                    "Active volunteer. Likes: 0, Retweets: 0"
                );
                assert_eq!(
                    behavior.emotional_tendencies,
                    "High engagement, likely positive sentiment"
                );
            } else {
                assert_eq!(behavior.content_preferences, "General news, local updates");
                assert_eq!(
                    behavior.engagement_patterns,
                    "Passive observer, low interaction"
                );
                assert_eq!(behavior.emotional_tendencies, "Neutral");
            }
        }
    }

    #[test]
    fn generated_document_reads_back() {
        let dir = fixture_dir();
        let mut config = Config::with_data_dir(dir.path());
        config.profiles_output = dir.path().join("synthetic_profiles.json");
        config.synthesis_seed = Some(5);

        let summary = run_profile_generation(&config).unwrap();
        let profiles = read_profiles(&summary.output).unwrap();
        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].demographics.age, "42");

        let text = fs::read_to_string(&summary.output).unwrap();
        assert!(text.contains("\"engagement_level\": \"High\""));
        assert!(text.starts_with("[\n    {"));
    }
}
