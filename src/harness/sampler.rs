// src/harness/sampler.rs — CPU / resident memory sampling of the harness process
//
// The harness samples ITSELF, not the child it launches. The number is a
// coarse proxy for the load a candidate puts on the host; switching to
// child-process sampling would change what every recorded metric means.

use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::infra::errors::PerfTuneError;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One point-in-time reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sample {
    pub cpu_percent: f64,
    pub memory_mb: f64,
}

pub struct ProcessSampler {
    system: System,
    pid: Pid,
}

impl ProcessSampler {
    /// Sampler bound to the current process.
    pub fn current() -> Result<Self, PerfTuneError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| PerfTuneError::Other(anyhow::anyhow!("cannot resolve own pid: {e}")))?;
        Ok(Self {
            system: System::new(),
            pid,
        })
    }

    fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
    }

    /// CPU utilization averaged over `window`, plus resident memory at the end of it.
    pub async fn sample(&mut self, window: Duration) -> Sample {
        self.refresh();
        tokio::time::sleep(window).await;
        self.refresh();

        self.system
            .process(self.pid)
            .map_or(Sample::default(), |p| Sample {
                cpu_percent: p.cpu_usage() as f64,
                memory_mb: p.memory() as f64 / BYTES_PER_MB,
            })
    }
}
