use crate::config::resolve_input_path;
use crate::core::{ConfigProvider, RoundSource};
use crate::domain::selection::SelectionRules;
use crate::utils::error::{HandicapError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportConfig,
    pub source: SourceConfig,
    pub selection: Option<SelectionConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
    #[serde(skip)]
    selection_rules: SelectionRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: String,
    pub endpoint: Option<String>,
    pub path: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    pub parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub recent_rounds: Option<usize>,
    pub qualifying_statuses: Option<Vec<String>>,
    pub require_status: Option<bool>,
    pub player: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub bundle: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_source_failure: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HandicapError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: TomlConfig =
            toml::from_str(&processed_content).map_err(|e| HandicapError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.selection_rules = config.build_selection_rules();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${API_TOKEN})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| HandicapError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn build_selection_rules(&self) -> SelectionRules {
        let defaults = SelectionRules::default();
        match &self.selection {
            Some(selection) => SelectionRules {
                recent_rounds: selection.recent_rounds.unwrap_or(defaults.recent_rounds),
                qualifying_statuses: selection
                    .qualifying_statuses
                    .clone()
                    .unwrap_or(defaults.qualifying_statuses),
                require_status: selection.require_status.unwrap_or(defaults.require_status),
            },
            None => defaults,
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;

        match self.source.r#type.as_str() {
            "api" => {
                let endpoint = self.source.endpoint.as_deref().ok_or_else(|| {
                    HandicapError::MissingConfigError {
                        field: "source.endpoint".to_string(),
                    }
                })?;
                validation::validate_url("source.endpoint", endpoint)?;
            }
            "file" => {
                let path = self.source.path.as_deref().ok_or_else(|| {
                    HandicapError::MissingConfigError {
                        field: "source.path".to_string(),
                    }
                })?;
                validation::validate_path("source.path", path)?;
                validation::validate_file_extension("source.path", path, &["csv", "json"])?;
            }
            other => {
                return Err(HandicapError::InvalidConfigValueError {
                    field: "source.type".to_string(),
                    value: other.to_string(),
                    reason: "Source type must be 'api' or 'file'".to_string(),
                })
            }
        }

        validation::validate_range(
            "selection.recent_rounds",
            self.selection_rules.recent_rounds,
            1,
            100,
        )?;
        if self.selection_rules.require_status
            && self
                .selection_rules
                .qualifying_statuses
                .iter()
                .all(|status| status.trim().is_empty())
        {
            return Err(HandicapError::InvalidConfigValueError {
                field: "selection.qualifying_statuses".to_string(),
                value: self.selection_rules.qualifying_statuses.join(","),
                reason: "At least one qualifying status is required unless require_status = false"
                    .to_string(),
            });
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;
        if let Some(bundle) = &self.load.bundle {
            validation::validate_file_extension("load.bundle", bundle, &["zip"])?;
        }

        if let Some(policy) = self
            .error_handling
            .as_ref()
            .and_then(|eh| eh.on_source_failure.as_deref())
        {
            if policy != "fail" && policy != "use_sample_data" {
                return Err(HandicapError::InvalidConfigValueError {
                    field: "error_handling.on_source_failure".to_string(),
                    value: policy.to_string(),
                    reason: "Expected 'fail' or 'use_sample_data'".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 是否啟用系統監控
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn source(&self) -> RoundSource {
        match self.source.r#type.as_str() {
            "file" => RoundSource::File {
                path: resolve_input_path(self.source.path.as_deref().unwrap_or_default()),
            },
            _ => RoundSource::Api {
                endpoint: self.source.endpoint.clone().unwrap_or_default(),
                headers: self.source.headers.clone().unwrap_or_default(),
                parameters: self.source.parameters.clone().unwrap_or_default(),
                timeout_seconds: self.source.timeout_seconds,
            },
        }
    }

    fn selection(&self) -> SelectionRules {
        self.selection_rules.clone()
    }

    fn player_filter(&self) -> Option<&str> {
        self.selection.as_ref().and_then(|s| s.player.as_deref())
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.load.bundle.as_deref()
    }

    fn use_sample_on_failure(&self) -> bool {
        self.error_handling
            .as_ref()
            .and_then(|eh| eh.on_source_failure.as_deref())
            == Some("use_sample_data")
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
