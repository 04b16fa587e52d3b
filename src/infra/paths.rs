// src/infra/paths.rs — Config path resolution
//
// PERFTUNE_HOME overrides everything; otherwise config lives in ~/.perftune/.

use std::path::PathBuf;

fn perftune_home() -> Option<PathBuf> {
    std::env::var_os("PERFTUNE_HOME").map(PathBuf::from)
}

/// Configuration directory: $PERFTUNE_HOME/ or ~/.perftune/
pub fn config_dir() -> PathBuf {
    if let Some(home) = perftune_home() {
        return home;
    }
    match directories::BaseDirs::new() {
        Some(base) => base.home_dir().join(".perftune"),
        None => PathBuf::from(".perftune"),
    }
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
