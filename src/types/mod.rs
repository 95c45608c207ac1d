// ABOUTME: Validated domain types shared across the orchestrator.
// ABOUTME: Hosts, proxy versions, image references, service names and typed IDs.

mod host;
mod id;
mod image_ref;
mod service_name;
mod version;

pub use host::Host;
pub use id::{ContainerId, Id, ImageId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use service_name::{ServiceName, ServiceNameError};
pub use version::{ProxyVersion, VersionError};
