// src/core/orchestrator.rs — Optimization loop and task submission

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use super::advisor::{Advisor, Backend};
use super::policy::{self, Stagnation, Verdict};
use super::registry::TaskRegistry;
use super::types::*;
use crate::harness::{Harness, Measurer};
use crate::infra::config::{Config, OptimizerConfig};
use crate::infra::errors::PerfTuneError;

/// Builds the advisor for a task from its backend selection.
pub type AdvisorFactory = Arc<dyn Fn(&Backend) -> Advisor + Send + Sync>;

/// A validated-on-submit optimization request.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub code: String,
    /// Consecutive non-improving cycles allowed before stopping.
    pub iterations: Option<u32>,
    pub runs: Option<u32>,
    pub backend: Backend,
}

impl SubmitRequest {
    pub fn new(code: impl Into<String>, backend: Backend) -> Self {
        Self {
            code: code.into(),
            iterations: None,
            runs: None,
            backend,
        }
    }
}

/// What one cycle produced before it is folded into the task record.
enum CycleResult {
    Measured {
        code: String,
        metrics: Metrics,
        verdict: Verdict,
    },
    Failed {
        reason: String,
    },
}

/// Owns the task registry and launches one optimization loop per submission.
#[derive(Clone)]
pub struct Orchestrator {
    registry: TaskRegistry,
    measurer: Arc<dyn Measurer>,
    advisors: AdvisorFactory,
    config: OptimizerConfig,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        let backends = config.backends.clone();
        let language = config.harness.language.clone();
        Self {
            registry: TaskRegistry::new(),
            measurer: Arc::new(Harness::new(config.harness.clone())),
            advisors: Arc::new(move |backend: &Backend| {
                Advisor::for_backend(backend, &backends, &language)
            }),
            config: config.optimizer.clone(),
        }
    }

    /// Replace how candidates are measured.
    pub fn with_measurer(mut self, measurer: Arc<dyn Measurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Replace how advisors are built for each backend.
    pub fn with_advisor_factory(
        mut self,
        factory: impl Fn(&Backend) -> Advisor + Send + Sync + 'static,
    ) -> Self {
        self.advisors = Arc::new(factory);
        self
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Register a task and start its loop in the background.
    ///
    /// Returns before any measurement happens: a status query issued right
    /// after sees `running` with an empty history. Must be called from
    /// within a tokio runtime.
    pub fn submit(&self, request: SubmitRequest) -> Result<String, PerfTuneError> {
        let iterations = request
            .iterations
            .unwrap_or(self.config.default_iterations);
        let runs = request.runs.unwrap_or(self.config.default_runs);
        if iterations == 0 {
            return Err(PerfTuneError::InvalidRequest(
                "iterations must be at least 1".into(),
            ));
        }
        if runs == 0 {
            return Err(PerfTuneError::InvalidRequest("runs must be at least 1".into()));
        }
        if request.code.trim().is_empty() {
            return Err(PerfTuneError::InvalidRequest("code cannot be empty".into()));
        }

        let task_id = uuid::Uuid::new_v4().to_string();
        self.registry.insert(Task::new(
            &task_id,
            request.code.clone(),
            request.backend.kind(),
            iterations,
            runs,
        ));

        let job = OptimizationJob {
            task_id: task_id.clone(),
            code: request.code,
            max_iterations: iterations,
            runs,
            advisor: (self.advisors)(&request.backend),
            measurer: self.measurer.clone(),
            registry: self.registry.clone(),
            pause: Duration::from_millis(self.config.cycle_pause_ms),
        };

        tracing::info!(
            task_id = %task_id,
            backend = ?request.backend.kind(),
            iterations,
            runs,
            "optimization task submitted"
        );

        let registry = self.registry.clone();
        let supervised_id = task_id.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(job.run()).catch_unwind().await;
            if let Err(panic) = result {
                let message = panic_message(panic.as_ref());
                tracing::error!(task_id = %supervised_id, "optimization loop panicked: {message}");
                registry.update(&supervised_id, |t| {
                    t.fail(format!("Optimization loop crashed: {message}"))
                });
            }
        });

        Ok(task_id)
    }

    /// Snapshot of a task, or `TaskNotFound`.
    pub fn get_status(&self, task_id: &str) -> Result<Task, PerfTuneError> {
        self.registry
            .get(task_id)
            .ok_or_else(|| PerfTuneError::TaskNotFound {
                id: task_id.to_string(),
            })
    }

    /// Poll until the task leaves `running`.
    pub async fn wait_for_terminal(
        &self,
        task_id: &str,
        poll: Duration,
    ) -> Result<Task, PerfTuneError> {
        loop {
            let task = self.get_status(task_id)?;
            if task.status.is_terminal() {
                return Ok(task);
            }
            tokio::time::sleep(poll).await;
        }
    }
}

/// Everything one task's loop needs, moved into its spawned future.
struct OptimizationJob {
    task_id: String,
    code: String,
    max_iterations: u32,
    runs: u32,
    advisor: Advisor,
    measurer: Arc<dyn Measurer>,
    registry: TaskRegistry,
    pause: Duration,
}

impl OptimizationJob {
    async fn run(self) {
        let id = self.task_id.as_str();

        // Initializing: unrunnable input never reaches the advisor.
        let initial = match self.measurer.measure(&self.code, self.runs).await {
            Ok(metrics) if metrics.success => metrics,
            Ok(_) | Err(_) => {
                tracing::warn!(task_id = %id, "initial code failed to execute");
                self.registry
                    .update(id, |t| t.fail(PerfTuneError::InitialCodeFailure.to_string()));
                return;
            }
        };

        let mut best_code = self.code.clone();
        let mut best = initial;
        self.registry.update(id, |t| {
            t.set_best(best_code.clone(), best);
            t.history
                .push(HistoryEntry::new(0, &best, CycleOutcome::Baseline));
        });

        let mut stagnation = Stagnation::new(self.max_iterations);
        let mut iteration: u32 = 0;

        // Running
        while !stagnation.exhausted() {
            iteration += 1;
            self.registry
                .update(id, |t| t.current_iteration = iteration);

            match self.cycle(&best_code, &best).await {
                CycleResult::Measured {
                    code,
                    metrics,
                    verdict: Verdict::Improved,
                } => {
                    stagnation.record(Verdict::Improved);
                    tracing::info!(
                        task_id = %id,
                        iteration,
                        cpu = metrics.cpu,
                        memory = metrics.memory,
                        time = metrics.time,
                        "candidate improved"
                    );
                    best_code = code;
                    best = metrics;
                    self.registry.update(id, |t| {
                        t.set_best(best_code.clone(), best);
                        t.history
                            .push(HistoryEntry::new(iteration, &best, CycleOutcome::Improved));
                    });
                }
                CycleResult::Measured {
                    metrics, verdict, ..
                } => {
                    stagnation.record(verdict);
                    tracing::debug!(task_id = %id, iteration, "candidate rejected");
                    self.registry.update(id, |t| {
                        t.history
                            .push(HistoryEntry::new(iteration, &metrics, CycleOutcome::Rejected));
                    });
                }
                CycleResult::Failed { reason } => {
                    stagnation.record_failure();
                    tracing::warn!(task_id = %id, iteration, "cycle failed: {reason}");
                    self.registry.update(id, |t| {
                        t.history.push(HistoryEntry::failed(iteration, &best, reason));
                    });
                }
            }

            if self.pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.pause).await;
            }
        }

        // Completed: best code/metrics were written with each improvement.
        self.registry.update(id, |t| t.complete());
        tracing::info!(
            task_id = %id,
            cycles = iteration,
            cpu = best.cpu,
            memory = best.memory,
            time = best.time,
            "optimization completed"
        );
    }

    /// One suggest → measure → judge step, always derived from the best code.
    async fn cycle(&self, best_code: &str, best: &Metrics) -> CycleResult {
        let candidate = match self.advisor.suggest(best_code, best).await {
            Ok(code) => code,
            Err(e) => {
                tracing::debug!(
                    task_id = %self.task_id,
                    retriable = e.is_retriable(),
                    "advisor call failed"
                );
                return CycleResult::Failed {
                    reason: format!("advisor: {e}"),
                };
            }
        };

        match self.measurer.measure(&candidate, self.runs).await {
            Ok(metrics) => CycleResult::Measured {
                verdict: policy::judge(best, &metrics),
                code: candidate,
                metrics,
            },
            Err(e) => {
                if !e.is_cycle_failure() {
                    tracing::error!(task_id = %self.task_id, "unexpected measurement error: {e}");
                }
                CycleResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
