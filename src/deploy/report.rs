// ABOUTME: Aggregated per-host outcome of one fleet operation.
// ABOUTME: Rendered as text or JSON; any failure makes the run fail.

use std::fmt;

use serde_json::json;

use super::{HostError, Mode};
use crate::error::{Error, Result};
use crate::types::Host;

#[derive(Debug)]
pub enum HostOutcome {
    Succeeded,
    Failed(HostError),
    /// Never started because an earlier host failed.
    Skipped,
}

#[derive(Debug)]
pub struct HostReport {
    pub host: Host,
    pub outcome: HostOutcome,
}

impl HostReport {
    pub(crate) fn finished(host: &Host, result: std::result::Result<(), HostError>) -> Self {
        let outcome = match result {
            Ok(()) => HostOutcome::Succeeded,
            Err(e) => HostOutcome::Failed(e),
        };
        Self {
            host: host.clone(),
            outcome,
        }
    }

    pub(crate) fn skipped(host: &Host) -> Self {
        Self {
            host: host.clone(),
            outcome: HostOutcome::Skipped,
        }
    }

    pub fn error(&self) -> Option<&HostError> {
        match &self.outcome {
            HostOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Report {
    mode: Mode,
    hosts: Vec<HostReport>,
}

impl Report {
    pub fn new(mode: Mode, hosts: Vec<HostReport>) -> Self {
        Self { mode, hosts }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn hosts(&self) -> &[HostReport] {
        &self.hosts
    }

    pub fn outcome(&self, address: &str) -> Option<&HostOutcome> {
        self.hosts
            .iter()
            .find(|r| r.host.address() == address)
            .map(|r| &r.outcome)
    }

    pub fn is_success(&self) -> bool {
        self.hosts
            .iter()
            .all(|r| matches!(r.outcome, HostOutcome::Succeeded))
    }

    pub fn failures(&self) -> impl Iterator<Item = &HostReport> {
        self.hosts.iter().filter(|r| r.error().is_some())
    }

    /// `(n, m)` for "stopped after host n of m" when a rolling run halted.
    pub fn stopped_after(&self) -> Option<(usize, usize)> {
        if self.mode != Mode::Rolling {
            return None;
        }
        self.hosts
            .iter()
            .position(|r| r.error().is_some())
            .map(|index| (index + 1, self.hosts.len()))
    }

    pub fn into_result(self) -> Result<()> {
        let failed = self.failures().count();
        if failed == 0 {
            Ok(())
        } else {
            Err(Error::HostsFailed {
                failed,
                total: self.hosts.len(),
            })
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let hosts: Vec<_> = self
            .hosts
            .iter()
            .map(|r| match &r.outcome {
                HostOutcome::Succeeded => json!({ "host": r.host.address(), "status": "succeeded" }),
                HostOutcome::Skipped => json!({ "host": r.host.address(), "status": "skipped" }),
                HostOutcome::Failed(e) => json!({
                    "host": r.host.address(),
                    "status": "failed",
                    "phase": e.phase().as_str(),
                    "error": e.cause().to_string(),
                }),
            })
            .collect();

        let mut report = json!({
            "event": "report",
            "mode": self.mode.as_str(),
            "success": self.is_success(),
            "hosts": hosts,
        });
        if let Some((n, m)) = self.stopped_after() {
            report["stopped_after"] = json!({ "host": n, "of": m });
        }
        report
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.hosts {
            let address = report.host.address();
            match &report.outcome {
                HostOutcome::Succeeded => writeln!(f, "  {address}: ok")?,
                HostOutcome::Skipped => writeln!(f, "  {address}: skipped")?,
                HostOutcome::Failed(e) => {
                    writeln!(f, "  {address}: failed during {}: {}", e.phase(), e.cause())?
                }
            }
        }
        if let Some((n, m)) = self.stopped_after() {
            writeln!(f, "stopped after host {n} of {m}")?;
        }
        Ok(())
    }
}
