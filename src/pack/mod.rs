//! Pack builds: running the package manager, caching results per nonce and
//! serializing builds.

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod runner;
pub mod service;

pub use cache::{PackCache, PackKey, PackOutcome};
pub use descriptor::{ArchiveDescriptor, PackOutput};
pub use error::{PackError, PackFailure};
pub use manifest::{find_manifest, PackageIndex, PackageManifest};
pub use runner::{CommandPackRunner, PackRunner};
pub use service::{validate_nonce, PackService};
