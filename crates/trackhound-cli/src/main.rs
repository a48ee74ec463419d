mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "trackhound=warn,trackhound_core=warn",
        1 => "trackhound=info,trackhound_core=info",
        2 => "trackhound=debug,trackhound_core=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Some(Commands::Fetch { query, options }) => {
            commands::fetch::run(&query.join(" "), &options, cli.config.as_deref()).await
        }
        Some(Commands::Batch {
            input,
            parallel,
            pause_ms,
            options,
        }) => {
            commands::batch::run(&input, parallel, pause_ms, &options, cli.config.as_deref()).await
        }
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await,
        None => {
            // Bare query is treated as a fetch command
            if !cli.query.is_empty() {
                let options = args::FetchOptions {
                    output: cli.output,
                    on_track_limit: None,
                    keep_temp: false,
                };
                commands::fetch::run(&cli.query.join(" "), &options, cli.config.as_deref()).await
            } else {
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
