// ABOUTME: Errors surfaced to the command line by portico.
// ABOUTME: Configuration problems, local failures and the aggregate of failed hosts.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Exec(#[from] crate::exec::ExecError),

    /// A fleet-wide hook failed before any host was touched.
    #[error("hook {name} failed: {reason}")]
    Hook { name: &'static str, reason: String },

    #[error("{failed} of {total} host(s) failed")]
    HostsFailed { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Exec,
    Hook,
    HostsFailed,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyExists(_)
            | Error::ConfigNotFound(_)
            | Error::UnknownDestination(_)
            | Error::MissingEnvVar(_)
            | Error::InvalidConfig(_)
            | Error::Yaml(_) => ErrorKind::Config,
            Error::Exec(_) => ErrorKind::Exec,
            Error::Hook { .. } => ErrorKind::Hook,
            Error::HostsFailed { .. } => ErrorKind::HostsFailed,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
