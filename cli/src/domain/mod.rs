//! Domain layer: pure cluster types, classification, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod instance;
pub mod session;
pub mod transfer;

pub use config::{ClusterConfig, ProviderConfig, ProvisioningConfig, TransferConfig};
pub use error::{ClusterError, ConfigError, ErrorKind};
pub use instance::{InstanceRef, InstanceState, Readiness, Reservation};
pub use session::SessionState;
pub use transfer::{TransferTarget, UploadSlot};
