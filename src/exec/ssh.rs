// ABOUTME: Executor backed by one lazily opened SSH session per host.
// ABOUTME: Sessions are shared between tasks and closed together at the end of a run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::{ExecError, Executor};
use crate::command::Cmd;
use crate::config::ServerConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::ssh::{CommandOutput, Session, SessionConfig};
use crate::types::Host;

pub struct SshExecutor {
    configs: HashMap<String, SessionConfig>,
    sessions: Mutex<HashMap<String, Arc<OnceCell<Session>>>>,
}

fn key(address: &str, port: u16) -> String {
    format!("{address}:{port}")
}

impl SshExecutor {
    pub fn new<'a>(servers: impl IntoIterator<Item = &'a ServerConfig>) -> Self {
        let configs = servers
            .into_iter()
            .map(|server| (key(&server.host, server.port), server.ssh_session_config()))
            .collect();

        Self {
            configs,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn session_config(&self, host: &Host) -> SessionConfig {
        self.configs
            .get(&key(host.address(), host.ssh_port()))
            .cloned()
            .unwrap_or_else(|| {
                let user = host
                    .ssh_user()
                    .map(str::to_string)
                    .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()));
                SessionConfig::new(host.address(), user).port(host.ssh_port())
            })
    }

    fn cell(&self, host: &Host) -> Arc<OnceCell<Session>> {
        self.sessions
            .lock()
            .entry(key(host.address(), host.ssh_port()))
            .or_default()
            .clone()
    }

    /// Close every open session; failures become warnings.
    pub async fn disconnect_all(&self, diagnostics: &Diagnostics) {
        let cells: Vec<_> = self.sessions.lock().drain().map(|(_, cell)| cell).collect();

        for cell in cells {
            if let Some(session) = cell.get()
                && let Err(e) = session.disconnect().await
            {
                diagnostics.warn(Warning::ssh_disconnect(format!("{}: {}", session.host(), e)));
            }
        }
    }

    async fn run(&self, host: &Host, cmd: &Cmd, input: Option<&[u8]>) -> Result<CommandOutput, ExecError> {
        let transport = |source: crate::ssh::Error| ExecError::Transport {
            host: host.to_string(),
            source,
        };
        let cell = self.cell(host);
        let session = cell
            .get_or_try_init(|| Session::connect(self.session_config(host)))
            .await
            .map_err(transport)?;

        let command = cmd.to_shell();
        match input {
            Some(input) => {
                tracing::debug!(host = %host, command = %cmd, bytes = input.len(), "exec with input");
                session.exec_with_input(&command, input).await
            }
            None => {
                tracing::debug!(host = %host, command = %cmd, "exec");
                session.exec(&command).await
            }
        }
        .map_err(transport)
    }
}

#[async_trait]
impl Executor for SshExecutor {
    async fn execute(&self, host: &Host, cmd: &Cmd) -> Result<CommandOutput, ExecError> {
        self.run(host, cmd, None).await
    }

    async fn execute_with_input(
        &self,
        host: &Host,
        cmd: &Cmd,
        input: &[u8],
    ) -> Result<CommandOutput, ExecError> {
        self.run(host, cmd, Some(input)).await
    }
}
