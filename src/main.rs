//! kino - find a stream for a title and make it playable
//!
//! # Usage
//!
//! ```bash
//! kino streams 27205 --imdb tt1375666
//! kino play 27205 --imdb tt1375666 --index 3
//! kino resolve "magnet:?xt=urn:btih:..." --json
//! kino watchlist list
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExitCode, Output};
use kino::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_filter().into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => return output.error(format!("{:#}", e), ExitCode::ConfigError),
        },
        None => Config::load(),
    };

    match cli.command {
        Command::Streams(cmd) => commands::streams_cmd(cmd, &config, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &config, &output).await,
        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &config, &output).await,
        Command::Watchlist(cmd) => commands::watchlist_cmd(cmd, &config, &output),
    }
}
