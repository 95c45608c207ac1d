// ABOUTME: Container registry credentials used for per-host login.
// ABOUTME: The password may come from the local environment.

use super::EnvValue;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Registry host; Docker Hub when omitted.
    #[serde(default)]
    pub server: Option<String>,
    pub username: String,
    pub password: EnvValue,
}
