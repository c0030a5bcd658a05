mod cli;
mod config;
mod storage;
mod tasks;
mod tui;

use std::io;

use crate::cli::{Command, ConfigCommand};
use crate::tasks::Presenter;
use clap::Parser;
use color_eyre::Result;
use devboard_core::reply::ResponseMode;
use devboard_task::TaskBoard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the task board.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    let presenter = Presenter {
        mode: if cli.json {
            ResponseMode::Json
        } else {
            ResponseMode::Page
        },
        today: chrono::Local::now().date_naive(),
        due_soon_days: config.due_soon_days(),
    };

    match cli.command.unwrap_or(Command::Board) {
        Command::Board => {
            let board = TaskBoard::new(storage::store_from_config(cli.file.as_deref(), &config)?);
            let tasks = board
                .list()
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            tui::launch(&tasks, &presenter)?
        }
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config()?,
        Command::Task(cmd) => {
            let board = TaskBoard::new(storage::store_from_config(cli.file.as_deref(), &config)?);
            let mut stdout = io::stdout().lock();
            tasks::handle(cmd, &board, &presenter, &mut stdout).await?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info. Logs go to stderr so
    // `--json` output stays machine-readable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("devboard {}", env!("CARGO_PKG_VERSION"));
}

fn init_config() -> Result<()> {
    let starter = config::Config {
        tasks_file: Some(storage::default_tasks_file()?),
        due_soon_days: Some(devboard_task::views::DEFAULT_DUE_SOON_DAYS),
    };
    let path = config::write_default_if_missing(&starter)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
