//! Process-level plumbing shared by the server binary: layered configuration,
//! logging bootstrap and OS-signal shutdown.

pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, LoggingConfig, Section, ServerConfig};
