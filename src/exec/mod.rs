// ABOUTME: The seam between orchestration and remote hosts.
// ABOUTME: One async call runs one built command on one host.

mod error;
mod ssh;

pub use error::{ExecError, ExecErrorKind};
pub use ssh::SshExecutor;

use async_trait::async_trait;

use crate::command::Cmd;
use crate::ssh::CommandOutput;
use crate::types::Host;

/// Runs commands on fleet hosts.
///
/// `execute` reports what the command did, including non-zero exits; only
/// transport problems are errors. `capture` treats a non-zero exit as a
/// failure and returns stdout.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, host: &Host, cmd: &Cmd) -> Result<CommandOutput, ExecError>;

    /// Like `execute`, with `input` written to the command's stdin.
    async fn execute_with_input(
        &self,
        host: &Host,
        cmd: &Cmd,
        input: &[u8],
    ) -> Result<CommandOutput, ExecError>;

    async fn capture(&self, host: &Host, cmd: &Cmd) -> Result<String, ExecError> {
        let output = self.execute(host, cmd).await?;
        succeeded(host, cmd, output)
    }

    /// Stream `input` into a command that writes it somewhere on the host.
    /// Keeps the content off the remote command line.
    async fn upload(&self, host: &Host, cmd: &Cmd, input: &[u8]) -> Result<(), ExecError> {
        let output = self.execute_with_input(host, cmd, input).await?;
        succeeded(host, cmd, output).map(drop)
    }
}

fn succeeded(host: &Host, cmd: &Cmd, output: CommandOutput) -> Result<String, ExecError> {
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(ExecError::NonZeroExit {
            host: host.to_string(),
            command: cmd.redacted(),
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}
