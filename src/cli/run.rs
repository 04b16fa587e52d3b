// src/cli/run.rs — `perftune optimize`: run one task in-process

use std::path::Path;
use std::time::Duration;

use crate::cli::progress;
use crate::core::advisor::Backend;
use crate::core::orchestrator::{Orchestrator, SubmitRequest};
use crate::core::types::TaskStatus;
use crate::infra::config::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct OptimizeArgs<'a> {
    pub file: &'a Path,
    pub iterations: Option<u32>,
    pub runs: Option<u32>,
    pub hosted: bool,
    pub api_key: Option<String>,
    pub quiet: bool,
}

/// Submit the file, stream history to stderr, print the best code to stdout.
pub async fn run_optimize(args: OptimizeArgs<'_>, config: &Config) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(args.file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", args.file.display()))?;

    if args.hosted && args.api_key.as_deref().is_none_or(str::is_empty) {
        eprintln!("[warn] --hosted given without a credential; using the local backend");
    }

    let orchestrator = Orchestrator::new(config);
    let mut request = SubmitRequest::new(code, Backend::from_submission(args.hosted, args.api_key));
    request.iterations = args.iterations;
    request.runs = args.runs;
    let task_id = orchestrator.submit(request)?;
    tracing::debug!(task_id = %task_id, "task started");

    let mut printed = 0;
    let task = loop {
        let task = orchestrator.get_status(&task_id)?;
        if !args.quiet {
            for entry in &task.history[printed..] {
                eprintln!("{}", progress::format_entry(entry, task.max_iterations));
            }
        }
        printed = task.history.len();
        if task.status.is_terminal() {
            break task;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    eprintln!("{}", progress::format_summary(&task));
    match task.status {
        TaskStatus::Completed => {
            println!("{}", task.best_code);
            Ok(())
        }
        _ => anyhow::bail!(task.error.unwrap_or_else(|| "optimization failed".into())),
    }
}
