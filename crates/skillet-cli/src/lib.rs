//! # skillet-cli
//!
//! Command-line interface for the Skillet agent.
//!
//! ## Commands
//!
//! - `skillet chat`: Interactive chat in the terminal (the default)
//! - `skillet skills`: List skills or show one
//! - `skillet prompt`: Print the rendered system prompt
//! - `skillet conversations`: List stored conversations
//! - `skillet config`: Show the effective configuration

pub mod commands;

pub use commands::Cli;
pub use commands::display::CliCallback;
