use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_persona_engine::config::Config;
use rust_persona_engine::encoder::AnswerMap;
use rust_persona_engine::pipeline;
use rust_persona_engine::synthesizer::BehaviorPolicy;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "persona-engine",
    version,
    about = "Synthetic voter profiles and party-affiliation prediction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fuse the source tables into a synthetic profile document
    Generate {
        /// Seed for the behaviour draws (default: PERSONA_SYNTHESIS_SEED or entropy)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output file (default: PERSONA_PROFILES_OUTPUT)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Behaviour policy: independent | normalized
        #[arg(short, long)]
        policy: Option<BehaviorPolicy>,
    },

    /// Train the party classifier on a labelled survey and save its artifacts
    Train {
        /// Survey CSV (default: PERSONA_SURVEY_PATH)
        #[arg(short, long)]
        survey: Option<PathBuf>,

        /// Label column in the survey (default: PERSONA_LABEL_COLUMN)
        #[arg(short, long)]
        label_column: Option<String>,
    },

    /// Predict a party from questionnaire answers
    Predict {
        /// Answers as QUESTION=LETTER pairs, e.g. Q1=A Q2=C
        answers: Vec<String>,

        /// JSON object of question id to answer letter
        #[arg(short = 'f', long)]
        answers_file: Option<PathBuf>,
    },
}

fn parse_answer(pair: &str) -> anyhow::Result<(String, String)> {
    match pair.split_once('=') {
        Some((question, answer)) if !question.trim().is_empty() => {
            Ok((question.trim().to_string(), answer.trim().to_string()))
        }
        _ => anyhow::bail!("Invalid answer '{}', expected QUESTION=LETTER", pair),
    }
}

fn collect_answers(pairs: &[String], file: Option<&PathBuf>) -> anyhow::Result<AnswerMap> {
    let mut answers = AnswerMap::new();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let from_file: AnswerMap = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON object of answers", path.display()))?;
        answers.extend(from_file);
    }
    for pair in pairs {
        let (question, answer) = parse_answer(pair)?;
        answers.insert(question, answer);
    }
    if answers.is_empty() {
        anyhow::bail!("No answers given; pass QUESTION=LETTER pairs or --answers-file");
    }
    Ok(answers)
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_persona_engine=info,persona_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Generate {
            seed,
            output,
            policy,
        } => {
            if seed.is_some() {
                config.synthesis_seed = seed;
            }
            if let Some(output) = output {
                config.profiles_output = output;
            }
            if let Some(policy) = policy {
                config.behavior_policy = policy;
            }

            let summary = pipeline::run_profile_generation(&config)?;
            println!("{}", summary.report);
            println!("Profiles written to {}", summary.output.display());
        }
        Commands::Train {
            survey,
            label_column,
        } => {
            if let Some(survey) = survey {
                config.survey_path = survey;
            }
            if let Some(label_column) = label_column {
                config.label_column = label_column;
            }

            let outcome = pipeline::run_training(&config)?;
            println!("{}", outcome.report);
        }
        Commands::Predict {
            answers,
            answers_file,
        } => {
            let answers = collect_answers(&answers, answers_file.as_ref())?;
            let label = pipeline::run_prediction(&config, &answers)?;
            println!("Predicted Party: {}", label);
        }
    }

    Ok(())
}
