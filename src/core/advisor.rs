// src/core/advisor.rs — Rewrite advisor
//
// Turns (code, metrics) into one candidate rewrite through whichever model
// backend the task was submitted with.

use std::sync::Arc;

use super::types::{BackendKind, Metrics};
use crate::infra::config::BackendsConfig;
use crate::infra::errors::PerfTuneError;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::openai_compat::OpenAICompatProvider;
use crate::provider::{ChatRequest, Credential, ModelProvider, StopReason};

/// Backend selection, fixed for the lifetime of a task.
#[derive(Debug, Clone)]
pub enum Backend {
    Local,
    Hosted { credential: Credential },
}

impl Backend {
    /// The hosted backend is used only when it is requested AND a non-empty
    /// credential accompanies the request; anything else runs locally.
    pub fn from_submission(use_hosted: bool, credential: Option<String>) -> Self {
        match credential.map(Credential::new) {
            Some(credential) if use_hosted && !credential.is_empty() => {
                Backend::Hosted { credential }
            }
            _ => Backend::Local,
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Local => BackendKind::Local,
            Backend::Hosted { .. } => BackendKind::Hosted,
        }
    }
}

pub struct Advisor {
    provider: Arc<dyn ModelProvider>,
    model: String,
    temperature: Option<f64>,
    max_tokens: u32,
    language: String,
}

impl Advisor {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: 2000,
            language: "Python".into(),
        }
    }

    /// Build the advisor for a backend using the configured endpoints and models.
    pub fn for_backend(backend: &Backend, config: &BackendsConfig, language: &str) -> Self {
        match backend {
            Backend::Local => {
                let provider = OpenAICompatProvider::local(config.local.base_url.clone());
                Self::new(Arc::new(provider), config.local.model.clone())
                    .with_temperature(config.local.temperature)
                    .with_max_tokens(config.local.max_tokens)
                    .with_language(language)
            }
            Backend::Hosted { credential } => {
                let provider =
                    AnthropicProvider::new(credential.clone(), config.hosted.base_url.clone());
                Self::new(Arc::new(provider), config.hosted.model.clone())
                    .with_max_tokens(config.hosted.max_tokens)
                    .with_language(language)
            }
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn build_instruction(&self, code: &str, metrics: &Metrics) -> String {
        format!(
            "Optimize this {lang} code to reduce CPU and memory usage.\n\
             \n\
             Current metrics:\n\
             - CPU: {cpu:.2}%\n\
             - Memory: {memory:.2} MB\n\
             - Time: {time:.4} seconds\n\
             \n\
             Code:\n\
             {code}\n\
             \n\
             Return ONLY the optimized {lang} code without any explanations or markdown formatting.",
            lang = self.language,
            cpu = metrics.cpu,
            memory = metrics.memory,
            time = metrics.time,
            code = code,
        )
    }

    /// Ask the backend for one rewrite of `code`, with code fences removed.
    pub async fn suggest(&self, code: &str, metrics: &Metrics) -> Result<String, PerfTuneError> {
        let request = ChatRequest {
            model: self.model.clone(),
            prompt: self.build_instruction(code, metrics),
            max_tokens: Some(self.max_tokens),
            temperature: self.temperature,
        };

        let response = self.provider.chat(request).await?;
        tracing::debug!(
            provider = self.provider.id(),
            tokens = response.usage.total(),
            "advisor response received"
        );

        if response.stop_reason == StopReason::MaxTokens {
            return Err(PerfTuneError::Provider {
                provider: self.provider.id().to_string(),
                message: format!("response truncated at {} tokens", self.max_tokens),
                retriable: false,
            });
        }

        let candidate = strip_code_fences(&response.content);
        if candidate.is_empty() {
            return Err(PerfTuneError::Provider {
                provider: self.provider.id().to_string(),
                message: "response contained no code".into(),
                retriable: false,
            });
        }
        Ok(candidate)
    }
}

/// Remove markdown code fences and trim.
///
/// Fence-only lines (```` ``` ```` with an optional language tag) become blank
/// lines, and fences glued to the start or end of a code line are cut off.
/// Everything else, including text between or after fenced blocks, is kept.
pub fn strip_code_fences(raw: &str) -> String {
    raw.lines()
        .map(strip_fence_markers)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn strip_fence_markers(line: &str) -> &str {
    let mut line = line;
    if let Some(rest) = line.trim_start().strip_prefix("```") {
        if is_fence_tag(rest.trim_end()) {
            return "";
        }
        line = rest;
    }
    match line.trim_end().strip_suffix("```") {
        Some(code) => code.trim_end(),
        None => line,
    }
}

/// Empty, or a single word such as `python`, `c++` or `objective-c`.
fn is_fence_tag(rest: &str) -> bool {
    rest.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '+' | '-' | '#' | '.' | '_'))
}
