// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::PerfTuneError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harness: HarnessConfig,

    #[serde(default)]
    pub optimizer: OptimizerConfig,

    #[serde(default)]
    pub backends: BackendsConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

/// How candidate programs are materialized and executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Runtime that executes a standalone source file given its path.
    pub interpreter: String,
    /// Extra arguments placed before the file path.
    pub args: Vec<String>,
    pub file_suffix: String,
    /// Language name used in the rewrite instruction.
    pub language: String,
    pub timeout_seconds: u64,
    /// Window for each CPU utilization sample of the harness process.
    pub cpu_sample_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".into(),
            args: Vec::new(),
            file_suffix: ".py".into(),
            language: "Python".into(),
            timeout_seconds: 30,
            cpu_sample_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub default_iterations: u32,
    pub default_runs: u32,
    /// Pause after each cycle so concurrent tasks get scheduled.
    pub cycle_pause_ms: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_iterations: 5,
            default_runs: 3,
            cycle_pause_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub local: LocalBackendConfig,
    #[serde(default)]
    pub hosted: HostedBackendConfig,
}

/// OpenAI-compatible completion server reachable without a credential (LM Studio by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".into(),
            model: "TheBloke/dolphin-2.2.1-mistral-7B-GGUF".into(),
            temperature: 1.1,
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedBackendConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for HostedBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com/v1".into(),
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Optional bearer token required on every request.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            token: None,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the optimization loop cannot run with.
    pub fn validate(&self) -> Result<(), PerfTuneError> {
        if self.harness.interpreter.trim().is_empty() {
            return Err(PerfTuneError::Config("harness.interpreter is empty".into()));
        }
        if self.harness.timeout_seconds == 0 {
            return Err(PerfTuneError::Config(
                "harness.timeout_seconds must be at least 1".into(),
            ));
        }
        if self.optimizer.default_iterations == 0 || self.optimizer.default_runs == 0 {
            return Err(PerfTuneError::Config(
                "optimizer defaults must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
