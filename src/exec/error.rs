// ABOUTME: Failures of a single remote command.
// ABOUTME: Transport errors and non-zero exits, both naming the host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: crate::ssh::Error,
    },

    #[error("{host}: `{command}` exited with status {exit_code}: {stderr}")]
    NonZeroExit {
        host: String,
        /// Redacted rendering; never carries secrets.
        command: String,
        exit_code: u32,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    Transport,
    NonZeroExit,
}

impl ExecError {
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::Transport { .. } => ExecErrorKind::Transport,
            ExecError::NonZeroExit { .. } => ExecErrorKind::NonZeroExit,
        }
    }

    pub fn host(&self) -> &str {
        match self {
            ExecError::Transport { host, .. } | ExecError::NonZeroExit { host, .. } => host,
        }
    }

    /// Whether the runtime reported that the target no longer exists.
    pub fn is_missing_resource(&self) -> bool {
        match self {
            ExecError::NonZeroExit { stderr, .. } => {
                stderr.contains("No such container") || stderr.contains("no such container")
            }
            ExecError::Transport { .. } => false,
        }
    }
}
