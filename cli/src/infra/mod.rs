//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! `aws` CLI adapter, the upload server and sender, and on-disk state.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod aws;
pub mod command_runner;
pub mod config;
pub mod file_sender;
pub mod state;
pub mod upload_server;
