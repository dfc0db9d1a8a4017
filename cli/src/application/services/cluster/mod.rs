//! Application services for the cluster lifecycle: session, provisioning,
//! and teardown.
//!
//! Each module imports only from `crate::domain` and
//! `crate::application::ports`.

pub mod provision;
pub mod reap;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use provision::{ProvisionOptions, launch, start_instances, wait_until_ready};
pub use reap::terminate_all;
pub use session::CloudSession;
