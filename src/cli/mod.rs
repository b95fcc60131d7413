//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;

pub use args::{parse_resolution, Args, Command, ConfigAction, ReplayArgs};
pub use commands::{handle_config_action, init_config, replay};
