//! Rehome CLI - move local git repositories to new GitHub ownership.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Rehome - rewrite authorship and move repositories to a new GitHub owner
#[derive(Parser, Debug)]
#[command(name = "rehome")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite history, repoint origin, create the GitHub repository and push
    Rewrite(commands::RewriteArgs),

    /// Try remote parsing and repository lookup against GitHub without pushing
    Demo(commands::DemoArgs),

    /// Show version information
    Version,
}

async fn run(command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Rewrite(args) => {
            let target = args.target_dir.display().to_string();
            commands::rewrite(args)
                .await
                .with_context(|| format!("rewrite of {target} failed"))
        }
        Commands::Demo(args) => {
            commands::demo(args).await.context("demo failed")?;
            Ok(0)
        }
        Commands::Version => {
            println!(
                "rehome {} (engine {})",
                env!("CARGO_PKG_VERSION"),
                rehome_migrate::VERSION
            );
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let debug = matches!(&cli.command, Commands::Rewrite(args) if args.debug);
    let log_level = match (cli.verbose, debug) {
        (0, false) => "warn",
        (1, false) => "info",
        (0..=2, _) => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rehome={log_level},rehome_migrate={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
