// src/harness/mod.rs — Measurement harness
//
// Materializes a snippet as a standalone file, runs it under the configured
// interpreter with a hard timeout, and averages cost over repeated runs.

pub mod sampler;

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::types::Metrics;
use crate::infra::config::HarnessConfig;
use crate::infra::errors::PerfTuneError;
use sampler::ProcessSampler;

/// Max characters of child stderr kept in a failure reason.
const STDERR_TAIL_CHARS: usize = 400;

/// Anything that can turn source code into averaged cost metrics.
#[async_trait]
pub trait Measurer: Send + Sync {
    async fn measure(&self, code: &str, runs: u32) -> Result<Metrics, PerfTuneError>;
}

pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run `code` `runs` times and average the samples.
    ///
    /// Fails as soon as any run exits non-zero, times out, or cannot be
    /// spawned; successful runs before it are discarded.
    pub async fn measure(&self, code: &str, runs: u32) -> Result<Metrics, PerfTuneError> {
        if runs == 0 {
            return Err(PerfTuneError::InvalidRuns);
        }

        let mut sampler = ProcessSampler::current()?;
        let mut samples = Vec::with_capacity(runs as usize);

        for run in 0..runs {
            let sample = self.run_once(code, &mut sampler).await?;
            tracing::debug!(
                run = run + 1,
                runs,
                cpu = sample.cpu,
                memory = sample.memory,
                time = sample.time,
                "measurement run finished"
            );
            samples.push(sample);
        }

        Metrics::mean(&samples).ok_or(PerfTuneError::InvalidRuns)
    }

    async fn run_once(
        &self,
        code: &str,
        sampler: &mut ProcessSampler,
    ) -> Result<Metrics, PerfTuneError> {
        // Removed when dropped, on every return path below.
        let script = self.materialize(code)?;
        let window = Duration::from_millis(self.config.cpu_sample_ms);

        let before = sampler.sample(window).await;
        let start = Instant::now();
        let outcome = self.execute(script.path()).await;
        let elapsed = start.elapsed();
        let after = sampler.sample(window).await;

        outcome?;

        Ok(Metrics {
            cpu: before.cpu_percent.max(after.cpu_percent),
            memory: after.memory_mb - before.memory_mb,
            time: elapsed.as_secs_f64(),
            success: true,
        })
    }

    fn materialize(&self, code: &str) -> Result<tempfile::NamedTempFile, PerfTuneError> {
        let mut file = tempfile::Builder::new()
            .prefix("perftune-")
            .suffix(&self.config.file_suffix)
            .tempfile()?;
        file.write_all(code.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    async fn execute(&self, path: &Path) -> Result<(), PerfTuneError> {
        let child = Command::new(&self.config.interpreter)
            .args(&self.config.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PerfTuneError::Execution {
                reason: format!("failed to spawn '{}': {e}", self.config.interpreter),
            })?;

        let limit = Duration::from_secs(self.config.timeout_seconds);
        let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result?,
            // Dropping the wait future drops the child, which kills it.
            Err(_) => {
                return Err(PerfTuneError::Timeout {
                    seconds: self.config.timeout_seconds,
                })
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = tail_chars(stderr.trim(), STDERR_TAIL_CHARS);
        let reason = if tail.is_empty() {
            format!("process exited with {}", output.status)
        } else {
            format!("process exited with {}: {}", output.status, tail)
        };
        Err(PerfTuneError::Execution { reason })
    }
}

#[async_trait]
impl Measurer for Harness {
    async fn measure(&self, code: &str, runs: u32) -> Result<Metrics, PerfTuneError> {
        Harness::measure(self, code, runs).await
    }
}

/// Last `max` characters of `s`, on a char boundary.
fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
