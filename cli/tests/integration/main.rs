//! Integration tests for the clusterboot CLI
//!
//! These tests bind real sockets and spawn the actual binary. They are
//! slower and should be run separately from unit tests.

mod file_transfer;
