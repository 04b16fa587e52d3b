// src/core/mod.rs — Optimization engine

pub mod advisor;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod types;
