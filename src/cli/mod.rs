//! CLI Module
//!
//! Command-line interface for the Floodrisk scoring pipeline.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Floodrisk - hazard and vulnerability layers to risk tiers and actions
///
/// Risk tiers are tertiles of the scored batch: they rank areas against
/// each other, not against a fixed scale.
#[derive(Parser, Debug)]
#[command(name = "floodrisk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score hazard and vulnerability layers into a risk map
    #[command(name = "build")]
    Build {
        /// Hazard layer (GeoJSON FeatureCollection)
        #[arg(long)]
        hazard: PathBuf,

        /// Vulnerability layers, overlaid in the order given
        #[arg(long = "vulnerability")]
        vulnerability: Vec<PathBuf>,

        /// Output file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Attach adaptation recommendations
        #[arg(long)]
        adapt: bool,
    },

    /// Attach recommendations to an existing risk map
    #[command(name = "recommend")]
    Recommend {
        /// Risk map written by `build`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score the built-in three-cell sample basin
    #[command(name = "demo")]
    Demo {
        /// Attach adaptation recommendations
        #[arg(long)]
        adapt: bool,
    },

    /// Print the effective settings
    #[command(name = "show-config")]
    ShowConfig,
}
