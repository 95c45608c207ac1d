// ABOUTME: Proxy release versions parsed from image tags.
// ABOUTME: Wraps semver ordering; tags like "v0.9.0" and "0.9.0" are accepted.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version tag is empty")]
    Empty,

    #[error("'{tag}' is not a major.minor.patch version")]
    Unparsable { tag: String },
}

/// A comparable proxy version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyVersion(semver::Version);

impl ProxyVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn parse(tag: &str) -> Result<Self, VersionError> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let bare = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        semver::Version::parse(bare)
            .map(Self)
            .map_err(|_| VersionError::Unparsable {
                tag: trimmed.to_string(),
            })
    }
}

impl FromStr for ProxyVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProxyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
