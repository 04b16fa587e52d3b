// src/cli/progress.rs — Terminal rendering of task history

use crate::core::types::{CycleOutcome, HistoryEntry, Task};

/// One progress line for a history entry.
pub fn format_entry(entry: &HistoryEntry, max_iterations: u32) -> String {
    let label = match entry.outcome {
        CycleOutcome::Baseline => "[baseline]".to_string(),
        _ => format!("[cycle {}]", entry.iteration),
    };
    let mut line = format!(
        "{label} cpu={:.2}% memory={:.2}MB time={:.4}s -> {}",
        entry.cpu, entry.memory, entry.time, entry.outcome,
    );
    if let Some(ref detail) = entry.detail {
        line.push_str(&format!(" ({detail})"));
    }
    if entry.outcome == CycleOutcome::Baseline {
        line.push_str(&format!(" [stops after {max_iterations} idle cycle(s)]"));
    }
    line
}

/// Final summary line once a task is terminal.
pub fn format_summary(task: &Task) -> String {
    match (&task.error, &task.best_metrics) {
        (Some(err), _) => format!("[error] {err}"),
        (None, Some(m)) => format!(
            "[done] cycles={} best cpu={:.2}% memory={:.2}MB time={:.4}s",
            task.current_iteration, m.cpu, m.memory, m.time,
        ),
        (None, None) => format!("[{}] no measurements", task.status),
    }
}
