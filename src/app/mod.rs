//! Application layer: command line, startup and the end-to-end run

pub mod cli;
pub mod error;
pub mod orchestrator;
pub mod startup;
