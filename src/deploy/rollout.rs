// ABOUTME: One host's sequence, parameterized by its current state.
// ABOUTME: Transitions consume the rollout, so phases cannot be skipped or repeated.

use super::state::{Idle, VersionChecked};
use super::{DeploymentPlan, Fleet, Operation};
use crate::command::ProxyInstance;
use crate::types::Host;

#[derive(Debug)]
pub struct Rollout<'a, S> {
    pub(crate) fleet: &'a Fleet<'a>,
    pub(crate) plan: &'a DeploymentPlan,
    pub(crate) host: &'a Host,
    pub(crate) state: S,
}

impl<'a> Rollout<'a, Idle> {
    pub fn new(fleet: &'a Fleet<'a>, plan: &'a DeploymentPlan, host: &'a Host) -> Self {
        Rollout {
            fleet,
            plan,
            host,
            state: Idle,
        }
    }
}

impl<'a, S> Rollout<'a, S> {
    pub fn host(&self) -> &Host {
        self.host
    }

    pub fn operation(&self) -> Operation {
        self.plan.operation
    }

    pub(crate) fn advance<T>(self, state: T) -> Rollout<'a, T> {
        Rollout {
            fleet: self.fleet,
            plan: self.plan,
            host: self.host,
            state,
        }
    }
}

impl Rollout<'_, VersionChecked> {
    /// The proxy as found before anything changed.
    pub fn instance(&self) -> &ProxyInstance {
        &self.state.instance
    }
}
