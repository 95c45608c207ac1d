// ABOUTME: Per-host rollout state markers for the type state pattern.
// ABOUTME: Each state only exposes the transition that may follow it.

use crate::command::ProxyInstance;

/// Nothing has touched the host yet.
/// Available actions: `check_version()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Versions are compatible; carries what was observed on the host.
/// Available actions: `update_proxy()`
#[derive(Debug, Clone)]
pub struct VersionChecked {
    pub(crate) instance: ProxyInstance,
}

/// The proxy container is running the configured image.
/// Available actions: `gate_dependents()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyUpdated;

/// Every dependent role on the host reported healthy.
/// Available actions: `swap_targets()`
#[derive(Debug, Clone, Copy, Default)]
pub struct DependentsHealthy;

/// Routed roles are registered with the proxy.
/// Available actions: `prune()`
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetsSwapped;

/// Retention applied; the host's sequence is complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct Done;
