// ABOUTME: Fleet orchestration: per-host typestate sequences, locking and strategies.
// ABOUTME: A plan is executed host by host (rolling) or all at once (parallel) into a report.

mod error;
mod fleet;
mod lock;
mod operations;
mod plan;
mod report;
mod rollout;
mod state;
mod strategy;
mod transitions;

pub use error::{HostError, Phase};
pub use fleet::Fleet;
pub use lock::{DeployLock, LockInfo};
pub use operations::{
    deploy_proxy, details, remove, remove_container, remove_host_directory, remove_image, restart,
    start, stop,
};
pub use plan::{DeploymentPlan, Operation, RegistryLogin};
pub use report::{HostOutcome, HostReport, Report};
pub use rollout::Rollout;
pub use state::{DependentsHealthy, Done, Idle, ProxyUpdated, TargetsSwapped, VersionChecked};
pub use strategy::{Mode, run};
pub use transitions::run_host;

pub(crate) use error::StepSnafu;
