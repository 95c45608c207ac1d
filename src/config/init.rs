// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented portico.yml template.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ImageRef, ServiceName};

use super::{CONFIG_FILENAME, Config, DEFAULT_IMAGE, MINIMUM_VERSION};

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(s) = service {
        config.service = ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(i) = image {
        config.image = ImageRef::parse(i).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let first_server = config.servers.first();
    format!(
        r#"service: {}
image: {}
servers:
  - host: {}
    port: {}
    user: {}
    # roles: [web]
    # runtime: docker

# roles:
#   web: {{}}
#   workers:
#     proxy: false
#     cmd: ["bin/jobs"]

# registry:
#   server: ghcr.io
#   username: deploy
#   password:
#     env: REGISTRY_PASSWORD

# proxy:
#   image: {}
#   minimum_version: {}
#   deploy_timeout: 30s
#   hosts: [app.example.com]

# health:
#   attempts: 7
#   interval: 1s

# retain_containers: 5
# drain_timeout: 30s
"#,
        config.service,
        config.image,
        first_server.host,
        first_server.port,
        first_server.user.as_deref().unwrap_or("deploy"),
        DEFAULT_IMAGE,
        MINIMUM_VERSION,
    )
}
