// ABOUTME: Command module aggregator for the portico CLI.
// ABOUTME: Loads config once per invocation and hands a Context to each handler.

mod control;
mod lifecycle;
mod logs;

pub use control::{Control, control, details, remove};
pub use lifecycle::deploy;
pub use logs::logs;

use crate::cli::Cli;
use portico::config::Config;
use portico::deploy::{Fleet, Report};
use portico::diagnostics::Diagnostics;
use portico::error::Result;
use portico::exec::SshExecutor;
use portico::output::Output;
use portico::proxy::SystemClock;
use std::env;
use std::path::PathBuf;

/// State shared by every command handler for one invocation.
pub struct Context {
    pub config: Config,
    pub executor: SshExecutor,
    pub clock: SystemClock,
    pub diagnostics: Diagnostics,
    pub output: Output,
    pub project_dir: PathBuf,
    pub break_lock: bool,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let project_dir = env::current_dir()?;

        let mut config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::discover(&project_dir)?,
        };
        if let Some(destination) = &cli.destination {
            config = config.for_destination(destination)?;
        }

        tracing::debug!(service = %config.service, hosts = config.servers.len(), "loaded configuration");

        Ok(Self {
            executor: SshExecutor::new(config.servers.iter()),
            config,
            clock: SystemClock,
            diagnostics: Diagnostics::default(),
            output: Output::new(cli.output_mode()),
            project_dir,
            break_lock: cli.break_lock,
        })
    }

    pub fn fleet(&self) -> Fleet<'_> {
        Fleet::new(&self.config, &self.executor, &self.clock, &self.diagnostics)
            .break_lock(self.break_lock)
    }

    /// Close sessions and print warnings, then surface the report as a result.
    pub async fn finish(self, title: &str, report: Result<Report>) -> Result<()> {
        self.executor.disconnect_all(&self.diagnostics).await;

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                self.output.warnings(&self.diagnostics);
                return Err(e);
            }
        };

        self.output.report(title, &report);
        self.output.warnings(&self.diagnostics);

        if report.is_success() {
            self.output.success(&format!("{title}: done"));
        }
        report.into_result()
    }
}
