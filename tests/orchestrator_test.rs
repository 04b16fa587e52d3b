// tests/orchestrator_test.rs — Integration test: optimization loop with mock backends

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use perftune::core::advisor::{Advisor, Backend};
use perftune::core::orchestrator::{Orchestrator, SubmitRequest};
use perftune::core::types::{CycleOutcome, Metrics, Task, TaskStatus};
use perftune::harness::Measurer;
use perftune::infra::config::Config;
use perftune::infra::errors::PerfTuneError;
use perftune::provider::*;

/// Replies in order, repeating the last one once the script runs out.
/// Records every prompt it was sent.
struct ScriptedProvider {
    replies: Vec<Result<String, String>>,
    next: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .into_iter()
                .map(|r| r.map(String::from).map_err(String::from))
                .collect(),
            next: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PerfTuneError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        let reply = &self.replies[i.min(self.replies.len() - 1)];
        match reply {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 20,
                },
                stop_reason: StopReason::EndTurn,
            }),
            Err(message) => Err(PerfTuneError::Provider {
                provider: "scripted".into(),
                message: message.clone(),
                retriable: false,
            }),
        }
    }
}

/// Looks measurements up by exact code. Unknown code fails to run;
/// code equal to "boom" panics.
#[derive(Default)]
struct TableMeasurer {
    table: HashMap<String, Metrics>,
    delay: Duration,
    runs_seen: Mutex<Vec<u32>>,
}

impl TableMeasurer {
    fn with(mut self, code: &str, cpu: f64, memory: f64, time: f64) -> Self {
        self.table.insert(
            code.to_string(),
            Metrics {
                cpu,
                memory,
                time,
                success: true,
            },
        );
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Measurer for TableMeasurer {
    async fn measure(&self, code: &str, runs: u32) -> Result<Metrics, PerfTuneError> {
        self.runs_seen.lock().unwrap().push(runs);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if code == "boom" {
            panic!("measurer exploded");
        }
        self.table
            .get(code)
            .copied()
            .ok_or_else(|| PerfTuneError::Execution {
                reason: format!("cannot run {code:?}"),
            })
    }
}

fn orchestrator(provider: Arc<ScriptedProvider>, measurer: Arc<TableMeasurer>) -> Orchestrator {
    let mut config = Config::default();
    config.optimizer.cycle_pause_ms = 0;
    Orchestrator::new(&config)
        .with_measurer(measurer)
        .with_advisor_factory(move |_backend: &Backend| Advisor::new(provider.clone(), "mock"))
}

fn request(code: &str, iterations: u32, runs: u32) -> SubmitRequest {
    let mut req = SubmitRequest::new(code, Backend::Local);
    req.iterations = Some(iterations);
    req.runs = Some(runs);
    req
}

async fn finish(orch: &Orchestrator, task_id: &str) -> Task {
    tokio::time::timeout(
        Duration::from_secs(10),
        orch.wait_for_terminal(task_id, Duration::from_millis(2)),
    )
    .await
    .expect("task did not finish in time")
    .unwrap()
}

fn iterations(task: &Task) -> Vec<u32> {
    task.history.iter().map(|h| h.iteration).collect()
}

#[tokio::test]
async fn test_initial_failure_ends_task_without_history() {
    let provider = ScriptedProvider::new(vec![Ok("v1")]);
    let measurer = Arc::new(TableMeasurer::default());
    let orch = orchestrator(provider.clone(), measurer);

    let id = orch.submit(request("broken", 3, 2)).unwrap();
    let task = finish(&orch, &id).await;

    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.error.as_deref(), Some("Initial code failed to execute"));
    assert!(task.history.is_empty());
    assert!(task.best_metrics.is_none());
    assert!(provider.prompts().is_empty(), "advisor must not be consulted");
}

#[tokio::test]
async fn test_failing_candidates_exhaust_budget() {
    let provider = ScriptedProvider::new(vec![Ok("does-not-run")]);
    let measurer = Arc::new(TableMeasurer::default().with("v0", 10.0, 4.0, 1.0));
    let orch = orchestrator(provider, measurer.clone());

    let id = orch.submit(request("v0", 3, 2)).unwrap();
    let task = finish(&orch, &id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(iterations(&task), vec![0, 1, 2, 3]);
    assert_eq!(task.history[0].outcome, CycleOutcome::Baseline);
    for entry in &task.history[1..] {
        assert_eq!(entry.outcome, CycleOutcome::Failed);
        // Failed cycles repeat the best metrics
        assert_eq!(entry.cpu, 10.0);
        assert_eq!(entry.time, 1.0);
        assert!(entry.detail.as_deref().unwrap().contains("cannot run"));
    }
    assert_eq!(task.best_code, "v0");
    assert_eq!(task.current_iteration, 3);
    // Every measurement used the task's run count
    assert!(measurer.runs_seen.lock().unwrap().iter().all(|&r| r == 2));
}

#[tokio::test]
async fn test_advisor_errors_are_failed_cycles() {
    let provider = ScriptedProvider::new(vec![Err("connection refused")]);
    let measurer = Arc::new(TableMeasurer::default().with("v0", 10.0, 4.0, 1.0));
    let orch = orchestrator(provider.clone(), measurer);

    let id = orch.submit(request("v0", 2, 1)).unwrap();
    let task = finish(&orch, &id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.history.len(), 3);
    let detail = task.history[1].detail.clone().unwrap();
    assert!(detail.starts_with("advisor: "), "{detail}");
    assert!(detail.contains("connection refused"));
    assert_eq!(provider.prompts().len(), 2);
}

#[tokio::test]
async fn test_improvement_resets_budget_and_seeds_next_prompt() {
    let provider = ScriptedProvider::new(vec![
        Ok("```python\nv1\n```"),
        Ok("v2"),
        Ok("v3"),
    ]);
    let measurer = Arc::new(
        TableMeasurer::default()
            .with("v0", 10.0, 10.0, 1.0)
            .with("v1", 5.0, 10.0, 1.0)
            .with("v2", 20.0, 20.0, 2.0)
            .with("v3", 20.0, 20.0, 2.0),
    );
    let orch = orchestrator(provider.clone(), measurer);

    let id = orch.submit(request("v0", 2, 1)).unwrap();
    let task = finish(&orch, &id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(iterations(&task), vec![0, 1, 2, 3]);
    let outcomes: Vec<CycleOutcome> = task.history.iter().map(|h| h.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            CycleOutcome::Baseline,
            CycleOutcome::Improved,
            CycleOutcome::Rejected,
            CycleOutcome::Rejected,
        ]
    );
    assert_eq!(task.best_code, "v1");
    assert_eq!(task.best_metrics.unwrap().cpu, 5.0);
    // Rejected entries record the candidate's own metrics
    assert_eq!(task.history[2].cpu, 20.0);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("Code:\nv0\n"));
    assert!(prompts[0].contains("- CPU: 10.00%"));
    assert!(prompts[1].contains("Code:\nv1\n"));
    assert!(prompts[1].contains("- CPU: 5.00%"));
    // A rejected candidate never becomes the next starting point
    assert!(prompts[2].contains("Code:\nv1\n"));
    assert!(!prompts[2].contains("v2"));
}

#[tokio::test]
async fn test_unsuccessful_initial_metrics_count_as_failure() {
    let provider = ScriptedProvider::new(vec![Ok("v1")]);
    let mut measurer = TableMeasurer::default();
    measurer.table.insert(
        "v0".into(),
        Metrics {
            cpu: 1.0,
            memory: 1.0,
            time: 1.0,
            success: false,
        },
    );
    let orch = orchestrator(provider, Arc::new(measurer));

    let id = orch.submit(request("v0", 1, 1)).unwrap();
    let task = finish(&orch, &id).await;
    assert_eq!(task.status, TaskStatus::Error);
}

#[tokio::test]
async fn test_submit_returns_before_measuring() {
    let provider = ScriptedProvider::new(vec![Err("offline")]);
    let measurer = Arc::new(
        TableMeasurer::default()
            .with("v0", 1.0, 1.0, 1.0)
            .delayed(Duration::from_millis(200)),
    );
    let orch = orchestrator(provider, measurer);

    let id = orch.submit(request("v0", 1, 1)).unwrap();
    let snapshot = orch.get_status(&id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Running);
    assert!(snapshot.history.is_empty());
    assert_eq!(snapshot.current_iteration, 0);

    let task = finish(&orch, &id).await;
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.history.len(), 2);
}

#[tokio::test]
async fn test_unknown_task_id() {
    let orch = orchestrator(
        ScriptedProvider::new(vec![Ok("x")]),
        Arc::new(TableMeasurer::default()),
    );
    let err = orch.get_status("00000000-0000-0000-0000-000000000000").unwrap_err();
    assert!(matches!(err, PerfTuneError::TaskNotFound { .. }));
}

#[tokio::test]
async fn test_panicking_task_does_not_affect_others() {
    let provider = ScriptedProvider::new(vec![Err("offline")]);
    let measurer = Arc::new(TableMeasurer::default().with("v0", 1.0, 1.0, 1.0));
    let orch = orchestrator(provider, measurer);

    let crashing = orch.submit(request("boom", 1, 1)).unwrap();
    let healthy = orch.submit(request("v0", 2, 1)).unwrap();
    assert_ne!(crashing, healthy);

    let crashed = finish(&orch, &crashing).await;
    assert_eq!(crashed.status, TaskStatus::Error);
    assert!(crashed
        .error
        .as_deref()
        .unwrap()
        .starts_with("Optimization loop crashed"));

    let done = finish(&orch, &healthy).await;
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.history.len(), 3);
    assert_eq!(orch.registry().list().len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_end_to_end_with_shell_harness() {
    use perftune::harness::Harness;
    use perftune::infra::config::HarnessConfig;

    let provider = ScriptedProvider::new(vec![Ok("```sh\nexit 0\n```"), Err("offline")]);
    let harness = Harness::new(HarnessConfig {
        interpreter: "sh".into(),
        args: vec![],
        file_suffix: ".sh".into(),
        language: "shell".into(),
        timeout_seconds: 10,
        cpu_sample_ms: 5,
    });

    let mut config = Config::default();
    config.optimizer.cycle_pause_ms = 0;
    let advisor_provider = provider.clone();
    let orch = Orchestrator::new(&config)
        .with_measurer(Arc::new(harness))
        .with_advisor_factory(move |_b: &Backend| {
            Advisor::new(advisor_provider.clone(), "mock").with_language("shell")
        });

    let id = orch.submit(request("sleep 0.3\n", 1, 1)).unwrap();
    let task = finish(&orch, &id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.best_code, "exit 0");
    assert_eq!(task.history[1].outcome, CycleOutcome::Improved);
    assert!(task.history[0].time >= 0.3);
    assert!(task.best_metrics.unwrap().time < task.history[0].time);
    assert!(provider.prompts()[0].starts_with("Optimize this shell code"));
}
