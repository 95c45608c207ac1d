// ABOUTME: Host-side filesystem commands under the portico state directory.
// ABOUTME: Proxy config directory, per-app marker directories, their count and env files.

use super::Cmd;
use crate::types::ServiceName;

pub(crate) const PROXY_DIR: &str = ".portico/proxy";
pub(crate) const PROXY_CONFIG_DIR: &str = ".portico/proxy/config";
const APPS_DIR: &str = ".portico/apps";

/// Runtime-independent commands on the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCommands;

impl HostCommands {
    pub fn ensure_proxy_dir(&self) -> Cmd {
        Cmd::new("mkdir").arg("-p").home(PROXY_CONFIG_DIR)
    }

    pub fn remove_proxy_dir(&self) -> Cmd {
        Cmd::new("rm").arg("-rf").home(PROXY_DIR)
    }

    /// Number of marker directories belonging to services other than `service`.
    pub fn count_other_apps(&self, service: &ServiceName) -> Cmd {
        Cmd::new("ls")
            .home(APPS_DIR)
            .quiet_errors()
            .pipe(Cmd::new("grep").arg("-vxF").arg(service.as_str()))
            .pipe(Cmd::new("wc").arg("-l"))
    }

    pub fn ensure_app_dir(&self, service: &ServiceName) -> Cmd {
        Cmd::new("mkdir")
            .arg("-p")
            .home(format!("{APPS_DIR}/{service}"))
    }

    /// Replace the role's env file with stdin, readable only by its owner.
    pub fn write_env_file(&self, service: &ServiceName, role: &str) -> Cmd {
        Cmd::new("mkdir")
            .arg("-p")
            .home(format!("{APPS_DIR}/{service}/env/roles"))
            .and(Cmd::new("umask").arg("077"))
            .and(Cmd::new("cat").op(">").home(env_file(service, role)))
    }
}

/// Home-relative path of the env file passed to `role` containers.
pub(crate) fn env_file(service: &ServiceName, role: &str) -> String {
    format!("{APPS_DIR}/{service}/env/roles/{role}.env")
}
