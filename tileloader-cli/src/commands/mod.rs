//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Disk cache management (clear, stats)
//! - [`config`] - Configuration management (path, show, init)
//! - [`warm`] - Pre-load the tiles around a location

pub mod cache;
pub mod config;
pub mod warm;
