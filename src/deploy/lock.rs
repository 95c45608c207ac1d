// ABOUTME: Per-host lock preventing two portico runs from driving the same proxy.
// ABOUTME: Atomic file creation under ~/.local/state/portico/ holding JSON lock info.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::Cmd;
use crate::exec::{ExecError, Executor};
use crate::proxy::ProxyError;
use crate::types::Host;

/// XDG state directory, relative to the remote home.
const STATE_DIR: &str = ".local/state/portico";
const LOCK_FILE: &str = ".local/state/portico/proxy.lock";

/// Who holds a lock and since when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub holder: String,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    /// The portico command holding the lock.
    pub command: String,
}

impl LockInfo {
    pub fn new(command: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            command: command.to_string(),
        }
    }

    /// Locks older than an hour are assumed abandoned.
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

fn acquire_cmd(json: &str) -> Cmd {
    // noclobber makes the redirect fail when the file exists
    Cmd::new("set")
        .arg("-C")
        .then(Cmd::new("echo").arg(json).op(">").home(LOCK_FILE))
}

fn read_cmd() -> Cmd {
    Cmd::new("cat").home(LOCK_FILE)
}

fn release_cmd() -> Cmd {
    Cmd::new("rm").arg("-f").home(LOCK_FILE)
}

/// A held lock; call [`release`](DeployLock::release) when the host is done.
pub struct DeployLock<'a> {
    executor: &'a dyn Executor,
    host: &'a Host,
}

impl std::fmt::Debug for DeployLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployLock")
            .field("host", &self.host.address())
            .finish()
    }
}

impl<'a> DeployLock<'a> {
    pub async fn acquire(
        executor: &'a dyn Executor,
        host: &'a Host,
        command: &str,
        break_lock: bool,
    ) -> Result<Self, ProxyError> {
        executor
            .capture(host, &Cmd::new("mkdir").arg("-p").home(STATE_DIR))
            .await?;

        let json = serde_json::to_string(&LockInfo::new(command))
            .map_err(|e| ProxyError::lock(format!("failed to serialize lock: {e}")))?;
        let acquire = acquire_cmd(&json);

        if executor.execute(host, &acquire).await?.success() {
            return Ok(Self { executor, host });
        }

        let existing = executor.execute(host, &read_cmd()).await?;
        let info = existing
            .success()
            .then(|| serde_json::from_str::<LockInfo>(existing.stdout.trim()).ok())
            .flatten();

        match info {
            Some(info) if !break_lock && !info.is_stale() => {
                return Err(ProxyError::LockHeld {
                    holder: info.holder,
                    pid: info.pid,
                    since: info.started_at,
                });
            }
            Some(info) => tracing::warn!(
                host = %host,
                holder = %info.holder,
                pid = info.pid,
                since = %info.started_at,
                "breaking deploy lock"
            ),
            None => tracing::warn!(host = %host, "lock info unreadable, breaking lock"),
        }

        executor.capture(host, &release_cmd()).await?;

        if executor.execute(host, &acquire).await?.success() {
            Ok(Self { executor, host })
        } else {
            Err(ProxyError::lock("lock acquired by another process during break"))
        }
    }

    pub async fn release(self) -> Result<(), ExecError> {
        self.executor.capture(self.host, &release_cmd()).await?;
        Ok(())
    }
}
