use crate::forest::ForestParams;
use crate::synthesizer::BehaviorPolicy;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub voters_file: String,
    pub party_members_file: String,
    pub election_results_file: String,
    pub volunteers_file: String,
    pub influencers_file: String,
    pub profiles_output: PathBuf,
    pub behavior_policy: BehaviorPolicy,
    pub synthesis_seed: Option<u64>, // None draws from OS entropy
    pub survey_path: PathBuf,
    pub label_column: String,
    pub artifact_dir: PathBuf,
    pub artifact_id: String,
    pub test_size: f64,
    pub train_seed: u64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir("Hack-Data")
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Defaults for every setting, reading sources from `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            voters_file: "oraniyil_tn.csv".to_string(),
            party_members_file: "DMK-party-Membership.csv".to_string(),
            election_results_file: "election_result.csv".to_string(),
            volunteers_file: "volunteer.csv".to_string(),
            influencers_file: "influnencer_data.csv".to_string(),
            profiles_output: PathBuf::from("synthetic_profiles.json"),
            behavior_policy: BehaviorPolicy::default(),
            synthesis_seed: None,
            survey_path: PathBuf::from("survey_1000_users.csv"),
            label_column: "Party".to_string(),
            artifact_dir: PathBuf::from("."),
            artifact_id: "party".to_string(),
            test_size: 0.2,
            train_seed: 42,
            n_estimators: 300,
            max_depth: None,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let artifact_id = var_or("PERSONA_ARTIFACT_ID", "party");
        if artifact_id.contains(&['/', '\\'][..]) {
            anyhow::bail!("PERSONA_ARTIFACT_ID cannot contain path separators");
        }

        let config = Self {
            data_dir: PathBuf::from(var_or("PERSONA_DATA_DIR", "Hack-Data")),
            voters_file: var_or("PERSONA_VOTERS_FILE", "oraniyil_tn.csv"),
            party_members_file: var_or("PERSONA_PARTY_MEMBERS_FILE", "DMK-party-Membership.csv"),
            election_results_file: var_or("PERSONA_ELECTION_RESULTS_FILE", "election_result.csv"),
            volunteers_file: var_or("PERSONA_VOLUNTEERS_FILE", "volunteer.csv"),
            influencers_file: var_or("PERSONA_INFLUENCERS_FILE", "influnencer_data.csv"),
            profiles_output: PathBuf::from(var_or(
                "PERSONA_PROFILES_OUTPUT",
                "synthetic_profiles.json",
            )),
            behavior_policy: var_or("PERSONA_BEHAVIOR_POLICY", "independent")
                .parse()
                .map_err(|e| anyhow::anyhow!("PERSONA_BEHAVIOR_POLICY: {}", e))?,
            synthesis_seed: optional_var("PERSONA_SYNTHESIS_SEED")
                .map(|seed| {
                    seed.trim().parse().map_err(|_| {
                        anyhow::anyhow!("PERSONA_SYNTHESIS_SEED must be an unsigned integer")
                    })
                })
                .transpose()?,
            survey_path: PathBuf::from(var_or("PERSONA_SURVEY_PATH", "survey_1000_users.csv")),
            label_column: var_or("PERSONA_LABEL_COLUMN", "Party"),
            artifact_dir: PathBuf::from(var_or("PERSONA_ARTIFACT_DIR", ".")),
            artifact_id,
            test_size: var_or("PERSONA_TEST_SIZE", "0.2")
                .trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("PERSONA_TEST_SIZE must be a number"))
                .and_then(|size| {
                    if !(size > 0.0 && size < 1.0) {
                        anyhow::bail!("PERSONA_TEST_SIZE must be between 0 and 1 (exclusive)");
                    }
                    Ok(size)
                })?,
            train_seed: var_or("PERSONA_TRAIN_SEED", "42")
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PERSONA_TRAIN_SEED must be an unsigned integer"))?,
            n_estimators: var_or("PERSONA_N_ESTIMATORS", "300")
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("PERSONA_N_ESTIMATORS must be a positive integer"))
                .and_then(|n| {
                    if n == 0 {
                        anyhow::bail!("PERSONA_N_ESTIMATORS must be greater than 0");
                    }
                    Ok(n)
                })?,
            max_depth: optional_var("PERSONA_MAX_DEPTH")
                .map(|depth| {
                    depth.trim().parse::<usize>().map_err(|_| {
                        anyhow::anyhow!("PERSONA_MAX_DEPTH must be a positive integer")
                    })
                })
                .transpose()?,
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Data directory: {}", config.data_dir.display());
        tracing::debug!("Behavior policy: {:?}", config.behavior_policy);
        if let Some(seed) = config.synthesis_seed {
            tracing::info!("Synthesis seed fixed: {}", seed);
        }
        tracing::debug!(
            "Artifacts: {}/{}_*",
            config.artifact_dir.display(),
            config.artifact_id
        );

        Ok(config)
    }

    pub fn source_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn voters_path(&self) -> PathBuf {
        self.source_path(&self.voters_file)
    }

    pub fn party_members_path(&self) -> PathBuf {
        self.source_path(&self.party_members_file)
    }

    pub fn election_results_path(&self) -> PathBuf {
        self.source_path(&self.election_results_file)
    }

    pub fn volunteers_path(&self) -> PathBuf {
        self.source_path(&self.volunteers_file)
    }

    pub fn influencers_path(&self) -> PathBuf {
        self.source_path(&self.influencers_file)
    }

    /// Forest hyper-parameters; the training seed also seeds the forest.
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            seed: self.train_seed,
            ..ForestParams::default()
        }
    }
}
