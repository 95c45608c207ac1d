// ABOUTME: Host identity for fleet operations.
// ABOUTME: Address, transport port, role tags and position in the configured list.

use crate::runtime::RuntimeType;
use std::fmt;

/// A remote machine the orchestrator drives.
///
/// Hosts are built once from configuration and never mutated; every
/// operation receives the host it acts on explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    address: String,
    port: u16,
    user: Option<String>,
    roles: Vec<String>,
    ordinal: usize,
    runtime: RuntimeType,
}

impl Host {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: 22,
            user: None,
            roles: Vec::new(),
            ordinal: 0,
            runtime: RuntimeType::default(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }

    pub fn runtime(mut self, runtime: RuntimeType) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn ssh_port(&self) -> u16 {
        self.port
    }

    pub fn ssh_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn role_tags(&self) -> &[String] {
        &self.roles
    }

    pub fn position(&self) -> usize {
        self.ordinal
    }

    pub fn container_runtime(&self) -> RuntimeType {
        self.runtime
    }

    /// Whether the host runs the given role. Hosts without tags run every role.
    pub fn serves(&self, role: &str) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|r| r == role)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
