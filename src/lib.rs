// src/lib.rs — Library root for perftune

pub mod api;
pub mod cli;
pub mod core;
pub mod harness;
pub mod infra;
pub mod provider;
