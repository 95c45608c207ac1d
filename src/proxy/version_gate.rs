// ABOUTME: Blocks proxy operations when a version is below the supported minimum.
// ABOUTME: Unparsable versions are rejected; they never satisfy a minimum.

use super::ProxyError;
use crate::command::ProxyInstance;
use crate::types::{ImageRef, ProxyVersion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Reject(String),
}

#[derive(Debug, Clone)]
pub struct VersionGate {
    minimum: ProxyVersion,
}

impl VersionGate {
    pub fn new(minimum: ProxyVersion) -> Self {
        Self { minimum }
    }

    pub fn minimum(&self) -> &ProxyVersion {
        &self.minimum
    }

    pub fn check(&self, current: &str) -> GateDecision {
        match ProxyVersion::parse(current) {
            Ok(version) if version >= self.minimum => GateDecision::Allow,
            _ => GateDecision::Reject(self.incompatible(current).to_string()),
        }
    }

    pub fn require(&self, current: &str) -> Result<(), ProxyError> {
        match self.check(current) {
            GateDecision::Allow => Ok(()),
            GateDecision::Reject(reason) => {
                tracing::debug!(%reason, "version gate rejected");
                Err(self.incompatible(current))
            }
        }
    }

    /// Gate what is running on a host; a host without a proxy passes.
    pub fn require_instance(&self, instance: &ProxyInstance) -> Result<(), ProxyError> {
        match instance.tag() {
            Some(tag) => self.require(&tag),
            None => Ok(()),
        }
    }

    /// Gate the image about to be started.
    pub fn require_image(&self, image: &ImageRef) -> Result<(), ProxyError> {
        self.require(image.version())
    }

    fn incompatible(&self, current: &str) -> ProxyError {
        let detected = if current.trim().is_empty() {
            "unknown".to_string()
        } else {
            current.trim().to_string()
        };
        ProxyError::VersionIncompatible {
            detected,
            required: self.minimum.clone(),
        }
    }
}
