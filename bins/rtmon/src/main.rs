//! rtmon - watch the kernel routing state through rtmirror.

mod commands;

use clap::{Parser, Subcommand};
use rtmirror::output::{DumpParams, DumpStyle};

#[derive(Parser)]
#[command(name = "rtmon", version, about = "Routing state monitor")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Show details.
    #[arg(short = 'd', long, global = true)]
    details: bool,

    /// Log debug output to stderr.
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Mirror caches and print every change (the default).
    #[command(visible_alias = "m", visible_alias = "mon")]
    Monitor(commands::monitor::MonitorCmd),

    /// Ask the kernel which route it would use for an address.
    #[command(visible_alias = "get")]
    RouteGet(commands::route_get::RouteGetCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let params = DumpParams::new()
        .with_json(cli.json)
        .with_style(if cli.details {
            DumpStyle::Details
        } else {
            DumpStyle::Line
        });

    let result = match cli.command {
        Some(Command::RouteGet(cmd)) => cmd.run(&params).await,
        Some(Command::Monitor(cmd)) => cmd.run(&params).await,
        None => commands::monitor::MonitorCmd::default().run(&params).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
