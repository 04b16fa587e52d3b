// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber on stderr, leaving stdout for results.
///
/// `PERFTUNE_LOG` wins over `RUST_LOG`, which wins over `level`.
pub fn init_logging(level: &str) {
    let filter = std::env::var("PERFTUNE_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    // try_init: tests may install a subscriber first.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
