//! Logging utilities.
//!
//! Only the bench binary installs a logger; library code logs through the
//! `log` facade.

mod init;

pub use init::{default_filter, init_logging, LoggingConfig};
