//! Commands enum and subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a mesh from an image (or tagged views)
    Generate(GenerateArgs),

    /// Manage generated assets
    Assets {
        #[command(subcommand)]
        command: AssetsCommand,
    },

    /// Copy an asset to another location
    Export {
        /// Asset to export
        asset: PathBuf,
        /// Destination file
        dest: PathBuf,
    },

    /// Show the log of the most recent generation
    Logs {
        /// Delete the stored log instead of printing it
        #[arg(long)]
        clear: bool,
    },

    /// Delete generated outputs and thumbnails
    CleanCache {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check the InstantMesh install and fetch missing weights
    Check {
        /// Prepare for low-VRAM inference
        #[arg(long)]
        low_vram: bool,
    },

    /// Show resolved paths for all meshgen directories
    Paths,
}

/// Arguments of `meshgen generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Text prompt
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Input image
    #[arg(short, long, conflicts_with = "views")]
    pub image: Option<PathBuf>,

    /// Tagged view as TAG=PATH (front, back, left, right, top, bottom); repeatable
    #[arg(long = "view", value_name = "TAG=PATH")]
    pub views: Vec<String>,

    /// Model to run
    #[arg(short, long, default_value = "instantmesh")]
    pub model: String,

    /// Trade speed for memory
    #[arg(long)]
    pub low_vram: bool,
}

/// Asset subcommands.
#[derive(Subcommand)]
pub enum AssetsCommand {
    /// List registered assets, newest last
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete an asset file and its entry
    Remove {
        /// Path of the asset
        path: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Register an existing mesh file
    Import {
        /// Mesh file
        path: PathBuf,
    },

    /// Load a registered asset into the viewport
    Show {
        /// Path of the asset
        path: PathBuf,
    },
}
