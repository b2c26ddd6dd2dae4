use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thymos_core::{LoggingConfig, ThymosConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod handler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = "thymos.toml", env = "THYMOS_CONFIG")]
    config: PathBuf,

    /// Use the mock classifier instead of the configured provider
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one bootstrap event and print the emotion block
    Hook {
        /// Read the event from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Render the current state without classifying anything
    Show {
        #[arg(short, long)]
        agent: String,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Apply user retention to an agent's state file
    Prune {
        #[arg(short, long)]
        agent: String,
    },
}

/// Logs go to stderr (stdout carries the block) or to `[logging].file`.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = &config.file else {
        builder.with_writer(std::io::stderr).init();
        return None;
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "thymos.log".into());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder.with_writer(writer).with_ansi(false).init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = ThymosConfig::load_or_default(&args.config);
    let _log_guard = init_logging(&config.logging);

    match args.command {
        Command::Hook { input } => {
            // Never fail the host: every error ends as "no block".
            match handler::run_hook(input.as_deref(), &config, args.dry_run).await {
                Ok(Some(block)) => println!("{}", block),
                Ok(None) => {}
                Err(e) => tracing::error!("Emotion hook failed: {:#}", e),
            }
        }
        Command::Show { agent, user } => {
            if let Some(block) = handler::show(&config, &agent, user.as_deref()) {
                println!("{}", block);
            }
        }
        Command::Prune { agent } => {
            let removed = handler::prune(&config, &agent).await?;
            println!("Pruned {} users", removed.len());
        }
    }
    Ok(())
}
