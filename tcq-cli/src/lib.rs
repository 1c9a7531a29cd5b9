//! tcq: search ThreatConnect indicators and groups from the terminal.

pub mod args;
pub mod config;
pub mod error;
pub mod history;
pub mod render;
pub mod repl;
pub mod session;
pub mod telemetry;
