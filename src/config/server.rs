// ABOUTME: Server entries for the fleet, with SSH connection settings.
// ABOUTME: Parses "host", "user@host", "host:port", "user@host:port" or detailed maps.

use crate::runtime::RuntimeType;
use crate::ssh::SessionConfig;
use crate::types::Host;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    /// Roles this server runs; every role when empty.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub runtime: RuntimeType,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

impl ServerConfig {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("server address cannot be empty".to_string());
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = match s.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port_str))?;
                (host, port)
            }
            None => (rest, default_port()),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(ServerConfig {
            host: host.to_string(),
            port,
            user: user_part.map(str::to_string),
            roles: Vec::new(),
            runtime: RuntimeType::default(),
            trust_first_connection: default_trust_first_connection(),
        })
    }

    /// The immutable host identity at `ordinal` in the server list.
    pub fn to_host(&self, ordinal: usize) -> Host {
        let host = Host::new(&self.host)
            .port(self.port)
            .roles(self.roles.iter().cloned())
            .ordinal(ordinal)
            .runtime(self.runtime);
        match &self.user {
            Some(user) => host.user(user),
            None => host,
        }
    }

    /// SSH settings; the user falls back to `$USER`, then root.
    pub fn ssh_session_config(&self) -> SessionConfig {
        let user = self
            .user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()));

        SessionConfig::new(&self.host, user)
            .port(self.port)
            .trust_on_first_use(self.trust_first_connection)
    }
}
