//! Ambient infrastructure shared by the platform binaries: configuration and logging.

pub mod config;
pub mod logging;
