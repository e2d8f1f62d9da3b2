//! veriface: offline tooling around enrolled face profiles.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

use veriface_session::{init_logging, LogFormat, SessionConfig};
use veriface_store::{profile_name, JsonProfileStore, ProfileStore};
use veriface_types::{Embedding, IdentityProfile, OperatingMode};
use veriface_verification::{decide, RetryCounter, VerificationOutcome};

#[derive(Parser)]
#[command(name = "veriface", about = "Offline face verification tooling")]
struct Cli {
    /// Subject whose profile to use.
    #[arg(long, env = "VERIFACE_SUBJECT")]
    subject: Option<String>,

    /// Operating mode: "on_site" or "remote".
    #[arg(long, env = "VERIFACE_MODE")]
    mode: Option<OperatingMode>,

    /// Directory holding `<subject>-<suffix>.json` profiles.
    #[arg(long, env = "VERIFACE_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VERIFACE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output: "human" or "json".
    #[arg(long, env = "VERIFACE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VERIFACE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show enrollment details of a profile.
    Inspect,
    /// Score a probe embedding against a profile.
    Match {
        /// JSON file holding the probe embedding as an array of numbers.
        #[arg(long)]
        probe: PathBuf,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Debug, Serialize)]
struct ProfileSummary {
    name: String,
    count: usize,
    dimension: Option<usize>,
    sufficient: bool,
}

#[derive(Debug, Serialize)]
struct MatchSummary {
    profile: String,
    nearest_index: Option<usize>,
    distance: Option<f32>,
    threshold: f32,
    outcome: VerificationOutcome,
    reason: &'static str,
}

/// Apply CLI flags on top of the file configuration (or defaults).
fn resolve_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(subject) = &cli.subject {
        config.subject_key = subject.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(dir) = &cli.profile_dir {
        config.profile_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn load_profile(config: &SessionConfig) -> anyhow::Result<IdentityProfile> {
    let subject = config.subject()?;
    let store = JsonProfileStore::new(&config.profile_dir);
    let profile = store
        .load(&subject, config.mode)
        .with_context(|| format!("loading profile {}", profile_name(&subject, config.mode)))?;
    Ok(profile)
}

fn summarize(config: &SessionConfig, profile: &IdentityProfile) -> ProfileSummary {
    ProfileSummary {
        name: profile_name(profile.subject(), profile.mode()),
        count: profile.len(),
        dimension: profile.dimension(),
        sufficient: profile.is_sufficient(config.min_base_data),
    }
}

fn read_probe(path: &Path) -> anyhow::Result<Embedding> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading probe {}", path.display()))?;
    let values: Vec<f32> = serde_json::from_str(&text)
        .with_context(|| format!("parsing probe {}", path.display()))?;
    Ok(Embedding::new(values)?)
}

/// Offline decision for one probe, with a fresh retry counter.
fn score(
    config: &SessionConfig,
    profile: &IdentityProfile,
    probe: &Embedding,
) -> anyhow::Result<MatchSummary> {
    let thresholds = config.thresholds();
    let params = config.params();
    let nearest = profile.nearest(probe)?;

    let outcome = match nearest {
        Some(nearest) if profile.is_sufficient(params.min_base_data) => {
            decide(nearest.distance, &thresholds, &params, &mut RetryCounter::new())
        }
        _ => VerificationOutcome::RejectedInsufficientProfile,
    };

    Ok(MatchSummary {
        profile: profile_name(profile.subject(), profile.mode()),
        nearest_index: nearest.map(|n| n.index),
        distance: nearest.map(|n| n.distance),
        threshold: thresholds.embedding_distance_threshold,
        outcome,
        reason: outcome.reason(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Inspect => {
            let profile = load_profile(&config)?;
            let summary = summarize(&config, &profile);
            tracing::debug!(?summary, "profile inspected");
            println!("profile:    {}", summary.name);
            println!("embeddings: {}", summary.count);
            match summary.dimension {
                Some(dim) => println!("dimension:  {dim}"),
                None => println!("dimension:  -"),
            }
            println!(
                "offline:    {}",
                if summary.sufficient {
                    "ready".to_string()
                } else {
                    format!("needs at least {} embeddings", config.min_base_data)
                }
            );
        }
        Command::Match { probe, json } => {
            let profile = load_profile(&config)?;
            let probe = read_probe(&probe)?;
            let summary = score(&config, &profile, &probe)?;
            tracing::info!(
                profile = %summary.profile,
                outcome = %summary.outcome,
                distance = ?summary.distance,
                "probe scored"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                if let (Some(index), Some(distance)) = (summary.nearest_index, summary.distance) {
                    println!("nearest:  #{index} at {distance:.4}");
                }
                println!("threshold: {:.2}", summary.threshold);
                println!("decision: {} ({})", summary.outcome, summary.reason);
            }
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn write_profile(dir: &Path, name: &str, embeddings: &str) {
        std::fs::write(
            dir.join(format!("{name}.json")),
            format!(r#"{{"embeddings": {embeddings}}}"#),
        )
        .unwrap();
    }

    fn config_for(dir: &Path, mode: OperatingMode) -> SessionConfig {
        SessionConfig {
            subject_key: "8495".into(),
            mode,
            profile_dir: dir.to_path_buf(),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "veriface",
            "--subject",
            "8495",
            "--mode",
            "on_site",
            "--log-format",
            "json",
            "inspect",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.subject_key, "8495");
        assert_eq!(config.mode, OperatingMode::OnSite);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.profile_dir, PathBuf::from("./profiles"));
    }

    #[test]
    fn scores_probe_against_stored_profile() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(
            dir.path(),
            "8495-remote",
            "[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]",
        );
        let config = config_for(dir.path(), OperatingMode::Remote);
        let profile = load_profile(&config).unwrap();

        let summary = score(&config, &profile, &Embedding::new(vec![0.0, 0.0, 3.0]).unwrap()).unwrap();
        assert_eq!(summary.outcome, VerificationOutcome::Accepted);
        assert_eq!(summary.nearest_index, Some(2));
        assert_eq!(summary.threshold, 0.30);

        let summary = score(&config, &profile, &Embedding::new(vec![1.0, 1.0, 1.0]).unwrap()).unwrap();
        assert_eq!(summary.outcome, VerificationOutcome::RejectedDistance);
    }

    #[test]
    fn small_profile_is_reported_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        write_profile(dir.path(), "8495-onsite", "[[1.0, 0.0]]");
        let config = config_for(dir.path(), OperatingMode::OnSite);
        let profile = load_profile(&config).unwrap();

        assert!(!summarize(&config, &profile).sufficient);
        let summary = score(&config, &profile, &Embedding::new(vec![1.0, 0.0]).unwrap()).unwrap();
        assert_eq!(summary.outcome, VerificationOutcome::RejectedInsufficientProfile);
        assert_eq!(summary.nearest_index, Some(0));
    }
}
