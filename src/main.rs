use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use nurtureverse::cli::{self, Commands};
use nurtureverse::core::Action;
use nurtureverse::{conversation, status};

#[derive(Parser)]
#[command(name = "nurtureverse")]
#[command(about = "Raise a virtual being: feed it, play with it, watch it evolve")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to the user config dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let data_dir = cli.data_dir;
    match cli.command {
        Commands::Status => status::handle_status(data_dir).await,
        Commands::Feed => cli::handle_action(Action::Feed, data_dir).await,
        Commands::Play => cli::handle_action(Action::Play, data_dir).await,
        Commands::Sleep => cli::handle_action(Action::Sleep, data_dir).await,
        Commands::Clean => cli::handle_action(Action::Clean, data_dir).await,
        Commands::Tick { periods } => cli::handle_tick(periods, data_dir).await,
        Commands::Chat { message, provider, model } => {
            cli::handle_chat(message, data_dir, provider, model).await
        }
        Commands::Task { command } => cli::handle_task(command, data_dir).await,
        Commands::Customize { name, personality, color } => {
            cli::handle_customize(name, personality, color, data_dir).await
        }
        Commands::Image { prompt } => cli::handle_image(prompt, data_dir).await,
        Commands::History { limit } => cli::handle_history(limit, data_dir).await,
        Commands::DebugRun => cli::handle_debug_run(data_dir).await,
        Commands::Save => cli::handle_save(data_dir).await,
        Commands::Talk { provider, model } => conversation::handle_talk(data_dir, provider, model).await,
    }
}
