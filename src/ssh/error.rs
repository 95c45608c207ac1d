// ABOUTME: Failures reaching a fleet host over SSH.
// ABOUTME: Anything here means the remote command never ran or its result was lost.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot reach {target}: {reason}")]
    Connection { target: String, reason: String },

    #[error("host key for {host} is unknown or changed; add it to known_hosts or enable trust_first_connection")]
    HostKeyRejected { host: String },

    #[error("authentication failed for {user}@{host}: no valid credentials")]
    AuthenticationFailed { user: String, host: String },

    #[error("SSH agent not available: {0}")]
    AgentUnavailable(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("failed to open channel: {0}")]
    Channel(String),

    #[error("remote command timed out after {0:?}")]
    CommandTimeout(Duration),

    #[error("channel closed before the remote command reported an exit status")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

impl Error {
    pub(crate) fn connection(target: impl Into<String>, reason: impl ToString) -> Self {
        Error::Connection {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
