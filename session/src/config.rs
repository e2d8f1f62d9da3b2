//! Session configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use veriface_liveness::ChallengePolicy;
use veriface_types::{
    select_config, Motion, OperatingMode, SubjectKey, ThresholdConfig, VerificationParams,
    DEFAULT_CAPTURE_DELAY_MS, MIN_BASE_DATA, RETRY_TIMEOUT,
};

use crate::logging::LogFormat;
use crate::SessionError;

/// Configuration for one verification session.
///
/// Can be loaded from a TOML file via [`SessionConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whose profile to verify against.
    #[serde(default)]
    pub subject_key: String,

    #[serde(default = "default_mode")]
    pub mode: OperatingMode,

    /// Directory holding `<subject>-<suffix>.json` profiles.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,

    /// Delay between the post-challenge idle tick and the photo.
    #[serde(default = "default_capture_delay_ms")]
    pub capture_delay_ms: u64,

    #[serde(default = "default_min_base_data")]
    pub min_base_data: usize,

    /// Distance failures tolerated before external fallback.
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout: u32,

    /// Restart the challenge after an acceptance; otherwise finish the session.
    #[serde(default = "default_true")]
    pub restart_on_accept: bool,

    #[serde(default)]
    pub reset_retries_on_accept: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-field overrides of the mode's default thresholds.
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

/// Optional replacements for individual [`ThresholdConfig`] fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_spoof_threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_distance_threshold: Option<f32>,
}

impl ThresholdOverrides {
    pub fn apply(&self, base: ThresholdConfig) -> ThresholdConfig {
        ThresholdConfig {
            detector_confidence: self.detector_confidence.unwrap_or(base.detector_confidence),
            anti_spoof_threshold: self.anti_spoof_threshold.unwrap_or(base.anti_spoof_threshold),
            embedding_distance_threshold: self
                .embedding_distance_threshold
                .unwrap_or(base.embedding_distance_threshold),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_mode() -> OperatingMode {
    OperatingMode::Remote
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("./profiles")
}

fn default_capture_delay_ms() -> u64 {
    DEFAULT_CAPTURE_DELAY_MS
}

fn default_min_base_data() -> usize {
    MIN_BASE_DATA
}

fn default_retry_timeout() -> u32 {
    RETRY_TIMEOUT
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SessionConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SessionError> {
        toml::from_str(s).map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SessionError> {
        toml::to_string_pretty(self).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn subject(&self) -> Result<SubjectKey, SessionError> {
        Ok(SubjectKey::new(self.subject_key.clone())?)
    }

    /// Mode defaults with any configured overrides applied.
    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds.apply(select_config(self.mode).thresholds)
    }

    pub fn params(&self) -> VerificationParams {
        VerificationParams {
            min_base_data: self.min_base_data,
            retry_timeout: self.retry_timeout,
        }
    }

    pub fn policy(&self) -> ChallengePolicy {
        ChallengePolicy {
            capture_delay: Duration::from_millis(self.capture_delay_ms),
            restart_on_accept: self.restart_on_accept,
            reset_retries_on_accept: self.reset_retries_on_accept,
            motions: Motion::ALL.to_vec(),
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.subject()?;
        let t = self.thresholds();
        if !(0.0..=1.0).contains(&t.detector_confidence) {
            return Err(SessionError::Config(format!(
                "detector_confidence must be within [0, 1], got {}",
                t.detector_confidence
            )));
        }
        if !t.anti_spoof_threshold.is_finite() {
            return Err(SessionError::Config(
                "anti_spoof_threshold must be finite".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&t.embedding_distance_threshold) {
            return Err(SessionError::Config(format!(
                "embedding_distance_threshold must be within [0, 2], got {}",
                t.embedding_distance_threshold
            )));
        }
        if self.min_base_data == 0 {
            return Err(SessionError::Config(
                "min_base_data must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject_key: String::new(),
            mode: default_mode(),
            profile_dir: default_profile_dir(),
            capture_delay_ms: default_capture_delay_ms(),
            min_base_data: default_min_base_data(),
            retry_timeout: default_retry_timeout(),
            restart_on_accept: true,
            reset_retries_on_accept: false,
            log_format: LogFormat::Human,
            log_level: default_log_level(),
            thresholds: ThresholdOverrides::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.capture_delay_ms, 600);
        assert_eq!(config.params(), VerificationParams::default());
        assert!(config.policy().restart_on_accept);
    }

    #[test]
    fn parses_full_file() {
        let config = SessionConfig::from_toml_str(
            r#"
            subject_key = "8495"
            mode = "on_site"
            profile_dir = "/var/lib/veriface"
            capture_delay_ms = 250
            retry_timeout = 5
            restart_on_accept = false
            log_format = "json"

            [thresholds]
            embedding_distance_threshold = 0.35
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, OperatingMode::OnSite);
        assert_eq!(config.subject().unwrap().as_str(), "8495");
        assert_eq!(config.policy().capture_delay, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);

        let t = config.thresholds();
        assert_eq!(t.embedding_distance_threshold, 0.35);
        assert_eq!(t.detector_confidence, ThresholdConfig::on_site().detector_confidence);
        config.validate().unwrap();
    }

    #[test]
    fn toml_roundtrip() {
        let config = SessionConfig {
            subject_key: "8495".into(),
            mode: OperatingMode::OnSite,
            ..SessionConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SessionConfig {
            subject_key: "8495".into(),
            ..SessionConfig::default()
        };
        config.validate().unwrap();

        config.thresholds.embedding_distance_threshold = Some(3.0);
        assert!(config.validate().is_err());

        config.thresholds = ThresholdOverrides::default();
        config.min_base_data = 0;
        assert!(config.validate().is_err());

        config.min_base_data = 3;
        config.subject_key = "../x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_mode_is_a_config_error() {
        assert!(matches!(
            SessionConfig::from_toml_str("mode = \"office\""),
            Err(SessionError::Config(_))
        ));
    }
}
