// ABOUTME: Health polling bounds for dependent containers.
// ABOUTME: Attempt count and the pause between attempts.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_attempts() -> u32 {
    7
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval: default_interval(),
        }
    }
}
