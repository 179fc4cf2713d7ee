//! Command-line interface for music-index.
//!
//! This module provides commands for managing watched directories, rescanning
//! them, and browsing the indexed library.

mod commands;

pub use commands::{Cli, Commands, run_command};
