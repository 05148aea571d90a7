//! Logging utilities.
//!
//! Centralizes logger initialization. The engine itself only depends on the
//! `log` facade; applications opt into the `env_logger` backend through
//! [`init_logging`].

mod init;

pub use init::{init_logging, LoggingConfig};
