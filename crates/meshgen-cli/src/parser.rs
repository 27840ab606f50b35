//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Generate 3D meshes from images with a local InstantMesh install.
#[derive(Parser)]
#[command(name = "meshgen")]
#[command(about = "Generate 3D meshes from images with InstantMesh")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
