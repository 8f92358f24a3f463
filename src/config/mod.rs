#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::{ConfigProvider, RoundSource};
#[cfg(feature = "cli")]
use crate::domain::handicap::RECENT_ROUNDS;
#[cfg(feature = "cli")]
use crate::domain::selection::SelectionRules;
#[cfg(feature = "cli")]
use crate::utils::error::{HandicapError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::collections::HashMap;

/// 相對路徑以目前工作目錄為準，避免被 LocalStorage 的輸出目錄吃掉
pub fn resolve_input_path(path: &str) -> String {
    std::path::absolute(path)
        .map(|resolved| resolved.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}

pub fn is_http_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "golf-handicap")]
#[command(about = "Calculate golf handicap indexes from scorecard rounds")]
pub struct CliConfig {
    /// Scorecard API URL or path to a .csv/.json export
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_values = ["csv", "json"])]
    pub formats: Vec<String>,

    /// Write every report file into a single ZIP with this name
    #[arg(long)]
    pub bundle: Option<String>,

    /// Only calculate the handicap of this player id
    #[arg(long)]
    pub player: Option<String>,

    #[arg(long, default_value_t = RECENT_ROUNDS)]
    pub recent_rounds: usize,

    #[arg(long, value_delimiter = ',', default_values = ["OK"])]
    pub statuses: Vec<String>,

    /// Accept rounds regardless of scorecard status
    #[arg(long)]
    pub any_status: bool,

    #[arg(long)]
    pub bearer_token: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Fall back to sample rounds when the source cannot be read
    #[arg(long)]
    pub use_sample_on_failure: bool,

    /// Calculate directly from these differentials and print the result
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub differentials: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn is_direct_calculation(&self) -> bool {
        !self.differentials.is_empty()
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn source(&self) -> RoundSource {
        let raw = self.source.as_deref().unwrap_or_default();
        if is_http_source(raw) {
            let mut headers = HashMap::new();
            if let Some(token) = &self.bearer_token {
                headers.insert("Authorization".to_string(), format!("Bearer {}", token));
            }
            RoundSource::Api {
                endpoint: raw.to_string(),
                headers,
                parameters: HashMap::new(),
                timeout_seconds: self.timeout_seconds,
            }
        } else {
            RoundSource::File {
                path: resolve_input_path(raw),
            }
        }
    }

    fn selection(&self) -> SelectionRules {
        SelectionRules {
            recent_rounds: self.recent_rounds,
            qualifying_statuses: self.statuses.clone(),
            require_status: !self.any_status,
        }
    }

    fn player_filter(&self) -> Option<&str> {
        self.player.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn use_sample_on_failure(&self) -> bool {
        self.use_sample_on_failure
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.is_direct_calculation() {
            return Ok(());
        }

        let source = self
            .source
            .as_deref()
            .ok_or_else(|| HandicapError::MissingConfigError {
                field: "--source".to_string(),
            })?;

        if is_http_source(source) {
            validation::validate_url("--source", source)?;
        } else {
            validation::validate_path("--source", source)?;
            validation::validate_file_extension("--source", source, &["csv", "json"])?;
        }

        validation::validate_path("--output-path", &self.output_path)?;
        validation::validate_output_formats("--formats", &self.formats)?;
        validation::validate_range("--recent-rounds", self.recent_rounds, 1, 100)?;

        if let Some(bundle) = &self.bundle {
            validation::validate_file_extension("--bundle", bundle, &["zip"])?;
        }
        if let Some(player) = &self.player {
            validation::validate_non_empty_string("--player", player)?;
        }
        if !self.any_status && self.statuses.iter().all(|s| s.trim().is_empty()) {
            return Err(HandicapError::InvalidConfigValueError {
                field: "--statuses".to_string(),
                value: self.statuses.join(","),
                reason: "At least one qualifying status is required unless --any-status is set"
                    .to_string(),
            });
        }

        Ok(())
    }
}
