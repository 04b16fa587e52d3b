// src/core/types.rs — Core domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Averaged cost of running one piece of code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// CPU utilization of the harness process, percent.
    pub cpu: f64,
    /// Resident memory delta of the harness process, megabytes.
    pub memory: f64,
    /// Wall-clock time of the child process, seconds.
    pub time: f64,
    pub success: bool,
}

impl Metrics {
    /// Arithmetic mean of each dimension. Returns `None` for an empty slice.
    pub fn mean(samples: &[Metrics]) -> Option<Metrics> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let (cpu, memory, time) = samples.iter().fold((0.0, 0.0, 0.0), |acc, s| {
            (acc.0 + s.cpu, acc.1 + s.memory, acc.2 + s.time)
        });
        Some(Metrics {
            cpu: cpu / n,
            memory: memory / n,
            time: time / n,
            success: samples.iter().all(|s| s.success),
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

/// How a history entry came about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CycleOutcome {
    /// Measurement of the submitted code (iteration 0).
    Baseline,
    Improved,
    Rejected,
    /// Advisor or measurement failed; metrics repeat the current best.
    Failed,
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleOutcome::Baseline => write!(f, "baseline"),
            CycleOutcome::Improved => write!(f, "improved"),
            CycleOutcome::Rejected => write!(f, "rejected"),
            CycleOutcome::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: u32,
    pub cpu: f64,
    pub memory: f64,
    pub time: f64,
    pub timestamp: DateTime<Utc>,
    pub outcome: CycleOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HistoryEntry {
    pub fn new(iteration: u32, metrics: &Metrics, outcome: CycleOutcome) -> Self {
        Self {
            iteration,
            cpu: metrics.cpu,
            memory: metrics.memory,
            time: metrics.time,
            timestamp: Utc::now(),
            outcome,
            detail: None,
        }
    }

    pub fn failed(iteration: u32, best: &Metrics, reason: impl Into<String>) -> Self {
        Self {
            detail: Some(reason.into()),
            ..Self::new(iteration, best, CycleOutcome::Failed)
        }
    }

    pub fn improved(&self) -> bool {
        self.outcome == CycleOutcome::Improved
    }
}

/// Which rewrite backend a task talks to. Serialized without the credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Hosted,
}

/// The record a status query returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub status: TaskStatus,
    pub history: Vec<HistoryEntry>,
    pub best_code: String,
    pub best_metrics: Option<Metrics>,
    pub current_iteration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub backend: BackendKind,
    pub max_iterations: u32,
    pub runs: u32,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        code: impl Into<String>,
        backend: BackendKind,
        max_iterations: u32,
        runs: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Running,
            history: Vec::new(),
            best_code: code.into(),
            best_metrics: None,
            current_iteration: 0,
            error: None,
            backend,
            max_iterations,
            runs,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Replace best code and metrics as one unit.
    pub fn set_best(&mut self, code: String, metrics: Metrics) {
        self.best_code = code;
        self.best_metrics = Some(metrics);
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = TaskStatus::Error;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.task_id.clone(),
            status: self.status,
            current_iteration: self.current_iteration,
            cycles: self.history.len(),
            best_metrics: self.best_metrics,
            created_at: self.created_at,
        }
    }
}

/// Compact listing view of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub status: TaskStatus,
    pub current_iteration: u32,
    pub cycles: usize,
    pub best_metrics: Option<Metrics>,
    pub created_at: DateTime<Utc>,
}
