// ABOUTME: The value describing one invocation: operation, mode, hosts and inputs.
// ABOUTME: Secrets are resolved once here so host tasks never touch the local environment.

use std::fmt;

use super::Mode;
use crate::config::{Config, resolve_env_map};
use crate::error::Result;
use crate::types::{Host, ImageRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Boot,
    Reboot,
    Upgrade,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Boot => "boot",
            Operation::Reboot => "reboot",
            Operation::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct RegistryLogin {
    pub server: Option<String>,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLogin")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub operation: Operation,
    pub mode: Mode,
    pub hosts: Vec<Host>,
    pub proxy_image: ImageRef,
    pub app_image: ImageRef,
    /// Application environment, sorted by key.
    pub env: Vec<(String, String)>,
    pub registry: Option<RegistryLogin>,
}

impl DeploymentPlan {
    pub fn build(config: &Config, operation: Operation, mode: Mode) -> Result<Self> {
        let registry = config
            .registry
            .as_ref()
            .map(|registry| -> Result<RegistryLogin> {
                Ok(RegistryLogin {
                    server: registry.server.clone(),
                    username: registry.username.clone(),
                    password: registry.password.resolve()?,
                })
            })
            .transpose()?;

        Ok(Self {
            operation,
            mode,
            hosts: config.hosts(),
            proxy_image: config.proxy.image.clone(),
            app_image: config.image.clone(),
            env: resolve_env_map(&config.env)?,
            registry,
        })
    }
}
