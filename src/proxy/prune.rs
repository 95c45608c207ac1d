// ABOUTME: Retention of stopped containers per role.
// ABOUTME: Keeps the newest K records and removes the rest, idempotently.

use super::ignore_missing;
use crate::command::{AppCommands, parse_records};
use crate::exec::{ExecError, Executor};
use crate::types::{ContainerId, Host};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruningPolicy {
    keep: usize,
}

impl PruningPolicy {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// `records` is newest first; everything past the first `keep` is returned.
    pub fn select_for_removal<T: Clone>(&self, records: &[T]) -> Vec<T> {
        records.iter().skip(self.keep).cloned().collect()
    }
}

/// Remove stopped containers of `role` beyond the policy, returning what was removed.
pub async fn prune_role(
    executor: &dyn Executor,
    host: &Host,
    app: &AppCommands<'_>,
    role: &str,
    policy: PruningPolicy,
) -> Result<Vec<ContainerId>, ExecError> {
    let stopped = parse_records(&executor.capture(host, &app.stopped(role)).await?);
    let doomed: Vec<ContainerId> = policy
        .select_for_removal(&stopped)
        .into_iter()
        .map(|record| record.id)
        .collect();

    if doomed.is_empty() {
        return Ok(doomed);
    }

    tracing::info!(host = %host, role, count = doomed.len(), "pruning stopped containers");
    ignore_missing(executor.capture(host, &app.remove(&doomed)).await)?;
    Ok(doomed)
}
