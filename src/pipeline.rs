//! Config-driven workflows: profile generation, classifier training and
//! single-shot prediction.
use crate::config::Config;
use crate::dataset::SurveyDataset;
use crate::encoder::AnswerMap;
use crate::errors::{AppError, ResultExt};
use crate::forest::RandomForest;
use crate::index::LookupIndex;
use crate::loader::load_csv;
use crate::models::{IndividualProfile, RawRecord};
use crate::predictor::predict_party;
use crate::storage::{write_profiles, FsArtifactStore};
use crate::synthesizer::{BehaviorPolicy, ProfileSynthesizer, SynthesisReport};
use crate::trainer::{Trainer, TrainingOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// The five source tables. Missing or unreadable files load as empty.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub voters: Vec<RawRecord>,
    pub party_members: Vec<RawRecord>,
    pub election_results: Vec<RawRecord>,
    pub volunteers: Vec<RawRecord>,
    pub influencers: Vec<RawRecord>,
}

impl SourceTables {
    pub fn load(config: &Config) -> Self {
        tracing::info!("Loading data...");
        let tables = Self {
            voters: load_csv(&config.voters_path()),
            party_members: load_csv(&config.party_members_path()),
            election_results: load_csv(&config.election_results_path()),
            volunteers: load_csv(&config.volunteers_path()),
            influencers: load_csv(&config.influencers_path()),
        };
        tracing::debug!(
            "Loaded {} voters, {} members, {} election rows, {} volunteers, {} influencers",
            tables.voters.len(),
            tables.party_members.len(),
            tables.election_results.len(),
            tables.volunteers.len(),
            tables.influencers.len()
        );
        tables
    }
}

/// Builds the lookup index and synthesizes one profile per voter.
pub fn generate_profiles<R: Rng + ?Sized>(
    tables: &SourceTables,
    policy: BehaviorPolicy,
    rng: &mut R,
) -> (Vec<IndividualProfile>, SynthesisReport) {
    let index = LookupIndex::build(&tables.party_members, &tables.election_results);

    ProfileSynthesizer::new(&index, &tables.volunteers, &tables.influencers)
        .with_policy(policy)
        .synthesize_all(&tables.voters, rng)
}

/// Outcome of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub output: PathBuf,
    pub report: SynthesisReport,
}

/// Loads sources, synthesizes profiles and writes them to `config.profiles_output`.
pub fn run_profile_generation(config: &Config) -> Result<GenerationSummary, AppError> {
    // Step 1: Load source tables
    let tables = SourceTables::load(config);

    // Step 2: Synthesize profiles
    let (profiles, report) = match config.synthesis_seed {
        Some(seed) => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            generate_profiles(&tables, config.behavior_policy, &mut rng)
        }
        None => {
            let mut rng = StdRng::from_entropy();
            generate_profiles(&tables, config.behavior_policy, &mut rng)
        }
    };
    tracing::info!("✓ {}", report);

    // Step 3: Write the profile document
    write_profiles(&config.profiles_output, &profiles)
        .context("Failed to write synthetic profiles")?;
    tracing::info!(
        "Successfully generated {} synthetic profiles in {}",
        profiles.len(),
        config.profiles_output.display()
    );

    Ok(GenerationSummary {
        output: config.profiles_output.clone(),
        report,
    })
}

/// Trains the forest on the configured survey and persists its artifacts.
pub fn run_training(config: &Config) -> Result<TrainingOutcome<RandomForest>, AppError> {
    tracing::info!("Step 1: Loading survey {}", config.survey_path.display());
    let dataset = SurveyDataset::load(&config.survey_path, &config.label_column)
        .context("Failed to load survey")?;

    tracing::info!(
        "Step 2: Training {} trees on {} rows",
        config.n_estimators,
        dataset.len()
    );
    let store = FsArtifactStore::new(&config.artifact_dir);
    let outcome = Trainer::new(config.forest_params())
        .with_split(config.test_size, config.train_seed)
        .train_and_persist(&dataset, &store, &config.artifact_id)?;

    tracing::info!(
        "✓ Model trained and saved as '{}' ({} train / {} test rows)",
        config.artifact_id,
        outcome.train_rows,
        outcome.test_rows
    );
    Ok(outcome)
}

/// Predicts a label for one answer set from the persisted artifacts.
pub fn run_prediction(config: &Config, answers: &AnswerMap) -> Result<String, AppError> {
    let store = FsArtifactStore::new(&config.artifact_dir);
    predict_party(&store, &config.artifact_id, answers)
}
