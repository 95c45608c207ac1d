// ABOUTME: Container runtime selection for Docker and Podman hosts.
// ABOUTME: Picks the CLI binary every built command is addressed to.

mod types;

pub use types::RuntimeType;
