//! Structured logging infrastructure for barrage
//!
//! Builds a `tracing` subscriber from the `logging` configuration domain:
//! - console and file targets, each with an optional level override
//! - text, compact, pretty or JSON formatting
//! - non-blocking file writers whose guards must outlive the program

pub mod init;

pub use init::{init_logging_from_config, init_simple_tracing, LoggingGuard};
