// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates service names, image refs, proxy versions and server lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::ServerConfig;
use crate::types::{ImageRef, ProxyVersion, ServiceName};

pub fn deserialize_service_name<'de, D>(deserializer: D) -> Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<ProxyVersion, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ProxyVersion::parse(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_servers<'de, D>(deserializer: D) -> Result<NonEmpty<ServerConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<ServerEntry> = Vec::deserialize(deserializer)?;
    let servers = collect_servers(values).map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(servers)
        .ok_or_else(|| serde::de::Error::custom("at least one server is required"))
}

pub fn deserialize_servers_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<ServerConfig>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(values) = Option::<Vec<ServerEntry>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let servers = collect_servers(values).map_err(serde::de::Error::custom)?;
    NonEmpty::from_vec(servers)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("destination servers list cannot be empty"))
}

fn collect_servers(values: Vec<ServerEntry>) -> Result<Vec<ServerConfig>, String> {
    values
        .into_iter()
        .map(ServerEntry::into_server_config)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerEntry {
    Simple(String),
    Detailed(ServerConfig),
}

impl ServerEntry {
    fn into_server_config(self) -> Result<ServerConfig, String> {
        match self {
            ServerEntry::Simple(s) => ServerConfig::parse(&s),
            ServerEntry::Detailed(c) => Ok(c),
        }
    }
}
