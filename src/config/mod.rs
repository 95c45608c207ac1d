// ABOUTME: Configuration types and parsing for portico.yml.
// ABOUTME: Handles YAML parsing, validation, env values and destination overlays.

mod deserialize;
mod env_value;
mod health;
mod init;
mod proxy;
mod registry;
mod role;
mod server;

pub use env_value::{EnvValue, resolve_env_map};
pub use health::HealthConfig;
pub use init::init_config;
pub use proxy::{DEFAULT_IMAGE, MINIMUM_VERSION, ProxySettings};
pub use registry::RegistryConfig;
pub use role::RoleConfig;
pub use server::ServerConfig;

use crate::error::{Error, Result};
use crate::types::{Host, ImageRef, ServiceName};
use deserialize::{
    deserialize_image_ref, deserialize_service_name, deserialize_servers,
    deserialize_servers_option,
};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "portico.yml";
pub const CONFIG_FILENAME_ALT: &str = "portico.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".portico/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub service: ServiceName,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    #[serde(deserialize_with = "deserialize_servers")]
    pub servers: NonEmpty<ServerConfig>,

    #[serde(default = "default_roles")]
    pub roles: BTreeMap<String, RoleConfig>,

    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,

    #[serde(default)]
    pub registry: Option<RegistryConfig>,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub health: HealthConfig,

    /// Stopped containers kept per role for manual rollback.
    #[serde(default = "default_retain_containers")]
    pub retain_containers: usize,

    /// Time the replaced container keeps serving in-flight requests before it is stopped.
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default, deserialize_with = "deserialize_servers_option")]
    pub servers: Option<NonEmpty<ServerConfig>>,

    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,
}

fn default_roles() -> BTreeMap<String, RoleConfig> {
    BTreeMap::from([("web".to_string(), RoleConfig::default())])
}

fn default_retain_containers() -> usize {
    5
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        candidates
            .iter()
            .find(|path| path.exists())
            .map(|path| Self::load(path))
            .unwrap_or_else(|| Err(Error::ConfigNotFound(dir.to_path_buf())))
    }

    fn validate(&self) -> Result<()> {
        if self.roles.is_empty() {
            return Err(Error::InvalidConfig("at least one role is required".to_string()));
        }

        // Role names end up in container names and labels.
        for role in self.roles.keys() {
            ServiceName::new(role)
                .map_err(|e| Error::InvalidConfig(format!("role '{}': {}", role, e)))?;
        }

        for server in self.servers.iter() {
            if let Some(unknown) = server.roles.iter().find(|r| !self.roles.contains_key(*r)) {
                return Err(Error::InvalidConfig(format!(
                    "server {} lists unknown role '{}'",
                    server.host, unknown
                )));
            }
        }

        if self.health.attempts == 0 {
            return Err(Error::InvalidConfig(
                "health.attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref servers) = dest.servers {
            merged.servers = servers.clone();
        }

        for (k, v) in &dest.env {
            merged.env.insert(k.clone(), v.clone());
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Hosts in configured order.
    pub fn hosts(&self) -> Vec<Host> {
        self.servers
            .iter()
            .enumerate()
            .map(|(ordinal, server)| server.to_host(ordinal))
            .collect()
    }

    /// Roles the proxy routes traffic to.
    pub fn routed_roles(&self) -> impl Iterator<Item = (&str, &RoleConfig)> {
        self.roles
            .iter()
            .filter(|(name, role)| role.is_routed(name))
            .map(|(name, role)| (name.as_str(), role))
    }

    /// Roles that must be healthy before routed roles are swapped.
    pub fn dependent_roles(&self) -> impl Iterator<Item = (&str, &RoleConfig)> {
        self.roles
            .iter()
            .filter(|(name, role)| !role.is_routed(name))
            .map(|(name, role)| (name.as_str(), role))
    }

    pub fn template() -> Self {
        Config {
            service: ServiceName::new("my-app").expect("template service name is valid"),
            image: ImageRef::parse("my-registry/my-app:latest").expect("template image is valid"),
            servers: NonEmpty::new(ServerConfig {
                host: "server.example.com".to_string(),
                port: 22,
                user: Some("deploy".to_string()),
                roles: Vec::new(),
                runtime: Default::default(),
                trust_first_connection: true,
            }),
            roles: default_roles(),
            env: BTreeMap::new(),
            registry: None,
            proxy: ProxySettings::default(),
            health: HealthConfig::default(),
            retain_containers: default_retain_containers(),
            drain_timeout: default_drain_timeout(),
            destinations: HashMap::new(),
        }
    }
}
