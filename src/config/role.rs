// ABOUTME: Application roles running on the fleet.
// ABOUTME: Routed roles sit behind the proxy; the rest are health-gated dependents.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleConfig {
    /// Whether the proxy routes to this role. Defaults to true for "web" only.
    #[serde(default)]
    pub proxy: Option<bool>,

    /// Command overriding the image's default.
    #[serde(default)]
    pub cmd: Option<Vec<String>>,
}

impl RoleConfig {
    pub fn is_routed(&self, name: &str) -> bool {
        self.proxy.unwrap_or(name == "web")
    }
}
