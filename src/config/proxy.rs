// ABOUTME: Settings for the proxy container and its deploy-target registration.
// ABOUTME: Every field has a default so a bare config boots the stock proxy.

use serde::Deserialize;
use std::time::Duration;

use super::deserialize::{deserialize_image_ref, deserialize_version};
use crate::types::{ImageRef, ProxyVersion};

pub const DEFAULT_IMAGE: &str = "basecamp/kamal-proxy:v0.9.0";
pub const MINIMUM_VERSION: &str = "v0.9.0";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    #[serde(deserialize_with = "deserialize_version")]
    pub minimum_version: ProxyVersion,

    pub container_name: String,
    pub network: String,
    pub http_port: u16,
    pub https_port: u16,
    pub log_max_size: String,

    /// Label carried by proxy images, used to prune containers and images.
    pub image_label: String,

    /// Runtime socket mounted into the proxy; runtime default when unset.
    pub control_socket: Option<String>,

    /// Port the application listens on inside its container.
    pub app_port: u16,

    #[serde(with = "humantime_serde")]
    pub deploy_timeout: Duration,

    pub buffer_requests: bool,
    pub buffer_responses: bool,
    pub log_request_headers: Vec<String>,
    pub hosts: Vec<String>,
    pub tls: bool,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            image: ImageRef::parse(DEFAULT_IMAGE).expect("default proxy image is valid"),
            minimum_version: ProxyVersion::parse(MINIMUM_VERSION)
                .expect("minimum proxy version is valid"),
            container_name: "kamal-proxy".to_string(),
            network: "kamal".to_string(),
            http_port: 80,
            https_port: 443,
            log_max_size: "10m".to_string(),
            image_label: "org.opencontainers.image.title=kamal-proxy".to_string(),
            control_socket: None,
            app_port: 80,
            deploy_timeout: Duration::from_secs(30),
            buffer_requests: true,
            buffer_responses: true,
            log_request_headers: vec![
                "Cache-Control".to_string(),
                "Last-Modified".to_string(),
                "User-Agent".to_string(),
            ],
            hosts: Vec::new(),
            tls: false,
        }
    }
}
