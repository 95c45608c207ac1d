// ABOUTME: SSH transport to fleet hosts.
// ABOUTME: Agent or key-file authentication with known_hosts verification.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
