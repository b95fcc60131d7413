//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::camera::ResolutionCandidate;

/// Automatic face capture: hold your face inside the guide box and a crop is taken
#[derive(Parser, Debug)]
#[command(name = "face-check")]
#[command(version, about = "Automatic face capture with a guide box", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the capture flow against a still image and a scripted detector
    Replay(ReplayArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Image served as every camera frame
    #[arg(long)]
    pub image: PathBuf,

    /// Detection script (TOML list of [[tick]] entries)
    #[arg(long)]
    pub script: PathBuf,

    /// Resolutions the simulated camera grants (WIDTHxHEIGHT, repeatable; default: any)
    #[arg(long = "supports", value_parser = parse_resolution)]
    pub supports: Vec<ResolutionCandidate>,

    /// Directory for captured images (overrides config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Display width for the overlay (overrides config)
    #[arg(long)]
    pub display_width: Option<u32>,

    /// Give up after this many seconds without a capture
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<ResolutionCandidate, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 600x600)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok(ResolutionCandidate { width, height })
}
