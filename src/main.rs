//! UX-Map CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use uxmap::cli::{commands, handle_error, Cli, Commands};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli.root, cli.json),
        Commands::PrepareRound => commands::prepare::execute(&cli.root, cli.json),
        Commands::MergeRound => commands::merge::execute(&cli.root, cli.json),
        Commands::Status => commands::status::execute(&cli.root, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
