// ABOUTME: Rolling and parallel execution of a per-host task across the fleet.
// ABOUTME: Rolling stops at the first failure; parallel lets every host finish.

use std::future::Future;

use futures::future::join_all;

use super::{HostError, HostReport, Report};
use crate::types::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// All hosts at once.
    Parallel,
    /// One host at a time, in configured order.
    Rolling,
}

impl Mode {
    pub fn rolling(rolling: bool) -> Self {
        if rolling { Mode::Rolling } else { Mode::Parallel }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Parallel => "parallel",
            Mode::Rolling => "rolling",
        }
    }
}

/// Run `task` for every host and collect one outcome per host, in host order.
///
/// Parallel mode never cancels siblings of a failed host. Rolling mode
/// leaves hosts after the first failure untouched and reports them skipped.
pub async fn run<'h, F, Fut>(mode: Mode, hosts: &'h [Host], task: F) -> Report
where
    F: Fn(&'h Host) -> Fut,
    Fut: Future<Output = Result<(), HostError>>,
{
    let outcomes = match mode {
        Mode::Parallel => {
            let results = join_all(hosts.iter().map(&task)).await;
            hosts
                .iter()
                .zip(results)
                .map(|(host, result)| HostReport::finished(host, result))
                .collect()
        }
        Mode::Rolling => {
            let mut outcomes = Vec::with_capacity(hosts.len());
            let mut halted = false;

            for host in hosts {
                if halted {
                    outcomes.push(HostReport::skipped(host));
                    continue;
                }

                tracing::info!(host = %host, "rolling to next host");
                let result = task(host).await;
                halted = result.is_err();
                outcomes.push(HostReport::finished(host, result));
            }
            outcomes
        }
    };

    Report::new(mode, outcomes)
}
