// ABOUTME: Test support utilities.
// ABOUTME: Scripted executor that answers commands by pattern and records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use portico::command::Cmd;
use portico::config::Config;
use portico::exec::{ExecError, Executor};
use portico::proxy::Clock;
use portico::ssh::{self, CommandOutput};
use portico::types::Host;
use std::collections::VecDeque;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("portico=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A canned answer to one command.
#[derive(Debug, Clone)]
pub enum Response {
    Output(CommandOutput),
    /// The command never reached the host.
    Unreachable,
}

pub fn ok(stdout: &str) -> Response {
    Response::Output(CommandOutput::ok(stdout))
}

pub fn fail(exit_code: u32, stderr: &str) -> Response {
    Response::Output(CommandOutput::failed(exit_code, stderr))
}

pub fn unreachable() -> Response {
    Response::Unreachable
}

struct Rule {
    host: Option<String>,
    pattern: String,
    /// Consumed front to back; the last answer repeats.
    responses: VecDeque<Response>,
}

/// Executor answering from rules; the first rule whose pattern is a
/// substring of the rendered command wins. Unmatched commands succeed
/// with empty output.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(String, String)>>,
    uploads: Mutex<Vec<(String, String)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, response: Response) -> Self {
        self.push(None, pattern, vec![response])
    }

    pub fn on_host(self, host: &str, pattern: &str, response: Response) -> Self {
        self.push(Some(host), pattern, vec![response])
    }

    /// Answer successive matching calls in order.
    pub fn sequence(self, pattern: &str, responses: Vec<Response>) -> Self {
        self.push(None, pattern, responses)
    }

    fn push(self, host: Option<&str>, pattern: &str, responses: Vec<Response>) -> Self {
        self.rules.lock().push(Rule {
            host: host.map(str::to_string),
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
        self
    }

    /// Every `(host, command)` executed, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    /// Every `(command, stdin)` pair sent with input, in order.
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().clone()
    }

    pub fn commands_on(&self, host: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(h, _)| h == host)
            .map(|(_, command)| command)
            .collect()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(_, command)| command.contains(needle))
            .count()
    }

    fn respond(&self, host: &Host, command: &str) -> Response {
        let mut rules = self.rules.lock();
        let rule = rules.iter_mut().find(|rule| {
            rule.host.as_deref().is_none_or(|h| h == host.address()) && command.contains(&rule.pattern)
        });

        match rule {
            Some(rule) if rule.responses.len() > 1 => rule.responses.pop_front().unwrap(),
            Some(rule) => rule.responses.front().cloned().unwrap(),
            None => ok(""),
        }
    }

    fn run(&self, host: &Host, command: String) -> Result<CommandOutput, ExecError> {
        self.calls
            .lock()
            .push((host.address().to_string(), command.clone()));

        match self.respond(host, &command) {
            Response::Output(output) => Ok(output),
            Response::Unreachable => Err(ExecError::Transport {
                host: host.to_string(),
                source: ssh::Error::Connection {
                    target: format!("{host}:22"),
                    reason: "connection refused".to_string(),
                },
            }),
        }
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, host: &Host, cmd: &Cmd) -> Result<CommandOutput, ExecError> {
        self.run(host, cmd.to_shell())
    }

    async fn execute_with_input(
        &self,
        host: &Host,
        cmd: &Cmd,
        input: &[u8],
    ) -> Result<CommandOutput, ExecError> {
        let command = cmd.to_shell();
        self.uploads
            .lock()
            .push((command.clone(), String::from_utf8_lossy(input).into_owned()));
        self.run(host, command)
    }
}

/// Executor running commands in a local `sh` with `HOME` pointed at a scratch directory.
pub struct LocalShell {
    pub home: std::path::PathBuf,
}

impl LocalShell {
    async fn run(&self, cmd: &Cmd, input: Option<&[u8]>) -> Result<CommandOutput, ExecError> {
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(cmd.to_shell())
            .env("HOME", &self.home)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .unwrap();

        let mut stdin = child.stdin.take().unwrap();
        if let Some(input) = input {
            stdin.write_all(input).await.unwrap();
        }
        drop(stdin);

        let output = child.wait_with_output().await.unwrap();
        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(1) as u32,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait]
impl Executor for LocalShell {
    async fn execute(&self, _host: &Host, cmd: &Cmd) -> Result<CommandOutput, ExecError> {
        self.run(cmd, None).await
    }

    async fn execute_with_input(
        &self,
        _host: &Host,
        cmd: &Cmd,
        input: &[u8],
    ) -> Result<CommandOutput, ExecError> {
        self.run(cmd, Some(input)).await
    }
}

/// Clock frozen at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Config with the given hosts and roles `web` (routed) plus `workers`.
pub fn config(hosts: &[&str]) -> Config {
    let servers: String = hosts.iter().map(|h| format!("  - deploy@{h}\n")).collect();
    let yaml = format!(
        r#"
service: app
image: registry.example.com/app:latest
servers:
{servers}
roles:
  web: {{}}
  workers:
    cmd: ["bin/jobs"]
health:
  attempts: 3
  interval: 1s
drain_timeout: 0s
retain_containers: 2
"#
    );
    Config::from_yaml(&yaml).unwrap()
}

/// `docker container ls` output for a running proxy at `tag`.
pub fn running_proxy(tag: &str) -> Response {
    ok(&format!("running basecamp/kamal-proxy:{tag}\n"))
}

/// Pattern matching the proxy inspect command.
pub const INSPECT: &str = "--format '{{.State}} {{.Image}}'";
pub const PROXY_RUN: &str = "run --name kamal-proxy";
pub const HEALTH: &str = "xargs -r docker inspect";
