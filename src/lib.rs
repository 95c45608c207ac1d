// ABOUTME: Library root for portico - exposes the orchestration engine for the CLI and tests.
// ABOUTME: The main binary is in main.rs.

pub mod command;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod hooks;
pub mod output;
pub mod proxy;
pub mod runtime;
pub mod ssh;
pub mod types;
