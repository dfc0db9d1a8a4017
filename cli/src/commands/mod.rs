//! Command implementations

pub mod config;
pub mod down;
pub mod receive;
pub mod send;
pub mod status;
pub mod up;
pub mod version;
