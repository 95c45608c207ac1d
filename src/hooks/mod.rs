// ABOUTME: Local hook scripts run around proxy reboots.
// ABOUTME: Discovered in .portico/hooks/ and given the run's context through the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::types::ServiceName;

/// Hook execution points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// Before the proxy is rebooted. Failure aborts.
    PreProxyReboot,
    /// After the proxy is rebooted. Failure is a warning.
    PostProxyReboot,
}

impl HookPoint {
    pub fn filename(&self) -> &'static str {
        match self {
            HookPoint::PreProxyReboot => "pre-proxy-reboot",
            HookPoint::PostProxyReboot => "post-proxy-reboot",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, HookPoint::PreProxyReboot)
    }
}

/// Context passed to hooks via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub service: ServiceName,
    pub hosts: Vec<String>,
    pub command: String,
}

impl HookContext {
    pub fn to_env(&self) -> HashMap<String, String> {
        HashMap::from([
            ("PORTICO_SERVICE".to_string(), self.service.to_string()),
            ("PORTICO_HOSTS".to_string(), self.hosts.join(",")),
            ("PORTICO_COMMAND".to_string(), self.command.clone()),
        ])
    }
}

#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookResult {
    /// One-line description of a failure for errors and warnings.
    pub fn failure_reason(&self) -> String {
        let status = self
            .exit_code
            .map(|code| format!("exit code {code}"))
            .unwrap_or_else(|| "no exit code".to_string());
        match self.stderr.trim() {
            "" => status,
            stderr => format!("{status}: {stderr}"),
        }
    }
}

/// Discovers and runs hooks from a project directory.
#[derive(Debug, Clone)]
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            hooks_dir: project_dir.join(".portico").join("hooks"),
        }
    }

    pub fn hook_exists(&self, point: HookPoint) -> bool {
        self.hook_path(point).is_file()
    }

    fn hook_path(&self, point: HookPoint) -> PathBuf {
        self.hooks_dir.join(point.filename())
    }

    /// Run a hook if it exists; `None` when there is no script.
    pub async fn run(&self, point: HookPoint, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path(point);

        if !hook_path.is_file() {
            return None;
        }

        tracing::info!("Running {} hook: {}", point.filename(), hook_path.display());

        let output = Command::new(&hook_path)
            .envs(context.to_env())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let result = match output {
            Ok(output) => HookResult {
                success: output.status.success(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => HookResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: e.to_string(),
            },
        };

        if result.success {
            tracing::info!("{} hook completed successfully", point.filename());
        } else {
            tracing::warn!(
                "{} hook failed with exit code {:?}",
                point.filename(),
                result.exit_code
            );
        }

        Some(result)
    }
}
