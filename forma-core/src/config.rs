use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{default_candidate_paths, DEFAULT_VALIDATION_MESSAGE};
use crate::logging::LoggingConfig;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// 提交默认选项（`[submit]`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitDefaults {
    /// 提交前是否校验（默认：true）
    pub validate: bool,
    /// 提交成功后是否重置表单（默认：false）
    pub reset_on_success: bool,
    /// 提交失败时是否不向调用方返回错误（默认：false）
    pub silent: bool,
}

impl Default for SubmitDefaults {
    fn default() -> Self {
        Self {
            validate: true,
            reset_on_success: false,
            silent: false,
        }
    }
}

/// 提交失败错误对账（`[reconcile]`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// 按顺序探测的错误树路径
    pub candidate_paths: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            candidate_paths: default_candidate_paths(),
        }
    }
}

/// 校验（`[validation]`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// 校验失败的默认消息
    pub message: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            message: DEFAULT_VALIDATION_MESSAGE.to_string(),
        }
    }
}

/// 表单配置
///
/// ```toml
/// [submit]
/// reset_on_success = true
///
/// [reconcile]
/// candidate_paths = ["body.errors"]
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub submit: SubmitDefaults,
    pub reconcile: ReconcileConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载 TOML 配置
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// 从字符串解析 TOML 配置，缺失的段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FormConfig = toml::from_str(content)?;
        tracing::debug!(
            "Loaded form config with {} candidate path(s)",
            config.reconcile.candidate_paths.len()
        );
        Ok(config)
    }

    /// 用环境变量覆盖配置
    ///
    /// 键名映射规则：`submit.reset_on_success` -> `{prefix}SUBMIT_RESET_ON_SUCCESS`；
    /// 候选路径为逗号分隔列表
    pub fn with_env_overrides(self, prefix: &str) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key_to_env(prefix, key)).ok())
    }

    /// 用任意键值来源覆盖配置，键为点分形式（例如 `submit.silent`）
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("submit.validate") {
            self.submit.validate = parse_bool("submit.validate", &value)?;
        }
        if let Some(value) = lookup("submit.reset_on_success") {
            self.submit.reset_on_success = parse_bool("submit.reset_on_success", &value)?;
        }
        if let Some(value) = lookup("submit.silent") {
            self.submit.silent = parse_bool("submit.silent", &value)?;
        }
        if let Some(value) = lookup("reconcile.candidate_paths") {
            self.reconcile.candidate_paths = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(value) = lookup("validation.message") {
            self.validation.message = value;
        }
        if let Some(value) = lookup("logging.level") {
            self.logging.level = value.parse()?;
        }
        if let Some(value) = lookup("logging.format") {
            self.logging.format = value.parse()?;
        }
        if let Some(value) = lookup("logging.filter") {
            self.logging.filter = Some(value);
        }

        Ok(self)
    }
}

/// 配置键转环境变量名，例如 `submit.silent` -> `FORMA_SUBMIT_SILENT`
pub fn key_to_env(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key.replace('.', "_").to_uppercase())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
