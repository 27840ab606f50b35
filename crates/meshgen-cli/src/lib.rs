//! # meshgen-cli
//!
//! Command-line front end for meshgen. `bootstrap` wires the runtime
//! adapters into a [`CliContext`]; handlers under [`handlers`] drive the
//! generation session and the asset registry.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use tokio_test as _;

// Only used by the binary.
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::{AssetsCommand, Commands, GenerateArgs};
pub use error::CliError;
pub use parser::Cli;
