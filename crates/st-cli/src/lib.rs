//! Screen-time analyzer CLI library.
//!
//! This crate provides the CLI interface for the screen-time analyzer.

mod cli;
pub mod commands;
mod config;

pub use cli::{CategoryAction, Cli, Commands};
pub use config::Config;
