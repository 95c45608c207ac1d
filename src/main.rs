// ABOUTME: Entry point for the portico CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use portico::config;
use portico::deploy::{Mode, Operation};
use portico::error::Result;
use portico::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output_mode());

    if let Err(e) = run(cli).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init {
        service,
        image,
        force,
    } = &cli.command
    {
        let cwd = env::current_dir()?;
        config::init_config(&cwd, service.as_deref(), image.as_deref(), *force)?;
        Output::new(cli.output_mode()).success("Created portico.yml");
        return Ok(());
    }

    let ctx = Context::load(&cli)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Boot => commands::deploy(ctx, Operation::Boot, Mode::Parallel).await,
        Commands::Reboot { rolling } => {
            commands::deploy(ctx, Operation::Reboot, Mode::rolling(rolling)).await
        }
        Commands::Upgrade { rolling } => {
            commands::deploy(ctx, Operation::Upgrade, Mode::rolling(rolling)).await
        }
        Commands::Start => commands::control(ctx, commands::Control::Start).await,
        Commands::Stop => commands::control(ctx, commands::Control::Stop).await,
        Commands::Restart => commands::control(ctx, commands::Control::Restart).await,
        Commands::Details => commands::details(ctx).await,
        Commands::Logs {
            lines,
            since,
            grep,
            follow,
        } => {
            let options = portico::command::LogOptions {
                lines,
                since,
                grep,
                follow,
            };
            commands::logs(ctx, options).await
        }
        Commands::Remove { force } => commands::remove(ctx, force).await,
        Commands::RemoveContainer => commands::control(ctx, commands::Control::RemoveContainer).await,
        Commands::RemoveImage => commands::control(ctx, commands::Control::RemoveImage).await,
        Commands::RemoveHostDirectory => {
            commands::control(ctx, commands::Control::RemoveHostDirectory).await
        }
    }
}
