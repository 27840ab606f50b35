//! CLI entry point.
//!
//! Loads `.env` files, installs tracing, composes the context and dispatches
//! the parsed command to its handler.

use clap::{CommandFactory, Parser};
use meshgen_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};
use meshgen_core::data_root;
use meshgen_core::paths::ENV_FILE;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_env_files() {
    // The data-root file wins over the working directory.
    if let Ok(root) = data_root() {
        dotenvy::from_path(root.join(ENV_FILE)).ok();
    }
    dotenvy::dotenv().ok();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(CliConfig::from_env()?);

    match command {
        Commands::Generate(args) => handlers::generate::execute(&ctx, &args).await?,
        Commands::Assets { command } => handlers::assets::execute(&ctx, &command)?,
        Commands::Export { asset, dest } => handlers::export::execute(&ctx, &asset, &dest)?,
        Commands::Logs { clear } => handlers::logs::execute(&ctx, clear)?,
        Commands::CleanCache { force } => handlers::clean_cache::execute(&ctx, force)?,
        Commands::Check { low_vram } => handlers::check::execute(&ctx, low_vram).await?,
        Commands::Paths => handlers::paths::execute(&ctx)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    load_env_files();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        eprintln!("Error: {err:#}");
        std::process::exit(code);
    }
}
