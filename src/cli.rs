//! CLI - Command Line Interface for kino
//!
//! Every step of the stream picker is scriptable. All output is
//! JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # List candidates for Inception (TMDB 27205, IMDB tt1375666)
//! kino streams 27205 --imdb tt1375666
//!
//! # Resolve the fourth candidate through Real-Debrid
//! kino play 27205 --imdb tt1375666 --index 3
//!
//! # Resolve a raw magnet
//! kino resolve "magnet:?xt=urn:btih:..."
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use kino::models::{MediaType, QualityTier, TitleRef};
use kino::resolve::ResolveError;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Requested item not found
    NotFound = 4,
    /// No streams available
    NoStreams = 5,
    /// Debrid resolution failed
    ResolveFailed = 6,
    /// Missing or invalid configuration
    ConfigError = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

impl From<&ResolveError> for ExitCode {
    fn from(err: &ResolveError) -> ExitCode {
        match err {
            ResolveError::Config(_) => ExitCode::ConfigError,
            ResolveError::Network(_) => ExitCode::NetworkError,
            _ => ExitCode::ResolveFailed,
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// kino - find a stream for a title and make it playable
#[derive(Parser, Debug)]
#[command(
    name = "kino",
    version,
    about = "Find streams for a movie and resolve them through Real-Debrid",
    long_about = "Lists embed servers and Torrentio releases for a title, and turns \
                  torrent releases into direct HTTP streams via Real-Debrid.\n\n\
                  Set REAL_DEBRID_API_KEY (or debrid_api_key in the config file) \
                  to resolve torrents.",
    after_help = "EXAMPLES:\n\
                  kino streams 27205 --imdb tt1375666          List candidates\n\
                  kino play 27205 --imdb tt1375666 -i 3        Resolve and play\n\
                  kino resolve \"magnet:?xt=urn:btih:...\"      Resolve a magnet\n\
                  kino watchlist list --json                  Saved titles"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verbose logging (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }

    /// Default tracing filter for the verbosity level
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "kino=info",
            _ => "kino=debug",
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List stream candidates for a title
    #[command(visible_alias = "st")]
    Streams(StreamsCmd),

    /// Resolve a candidate and print how to play it
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Resolve a raw magnet link through Real-Debrid
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),

    /// Manage the local watchlist
    #[command(visible_alias = "wl")]
    Watchlist(WatchlistCmd),
}

// =============================================================================
// Title Arguments
// =============================================================================

/// Identifies the title to look up
#[derive(Args, Debug, Clone)]
pub struct TitleArgs {
    /// TMDB ID (used for embed servers)
    #[arg(required = true)]
    pub tmdb_id: String,

    /// IMDB ID (e.g., tt1375666), enables Torrentio results
    #[arg(long)]
    pub imdb: Option<String>,

    /// Season number (for TV shows)
    #[arg(long, short = 's', requires = "episode")]
    pub season: Option<u16>,

    /// Episode number (for TV shows)
    #[arg(long, short = 'e', requires = "season")]
    pub episode: Option<u16>,
}

impl TitleArgs {
    /// Validate and convert into a lookup key
    pub fn title_ref(&self) -> Result<TitleRef, &'static str> {
        if let Some(imdb) = &self.imdb {
            validate_imdb_id(imdb)?;
        }
        Ok(match (self.season, self.episode) {
            (Some(season), Some(episode)) => {
                TitleRef::episode(&self.tmdb_id, self.imdb.clone(), season, episode)
            }
            _ => TitleRef::movie(&self.tmdb_id, self.imdb.clone()),
        })
    }
}

// =============================================================================
// Streams Command
// =============================================================================

/// List embed servers and torrent releases for a title
#[derive(Args, Debug)]
pub struct StreamsCmd {
    #[command(flatten)]
    pub title: TitleArgs,

    /// Filter torrents by minimum quality
    #[arg(long, short = 'Q', value_enum)]
    pub quality: Option<QualityFilter>,

    /// Maximum number of torrent results
    #[arg(long, short = 'l', default_value = "20")]
    pub limit: usize,
}

/// Quality filter for torrent candidates
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityFilter {
    /// 4K / 2160p
    #[value(name = "4k", alias = "2160p")]
    Q4k,
    /// 1080p Full HD
    #[value(name = "1080p")]
    Q1080p,
    /// 720p HD
    #[value(name = "720p")]
    Q720p,
}

impl QualityFilter {
    /// Lowest tier that passes the filter
    pub fn min_tier(&self) -> QualityTier {
        match self {
            QualityFilter::Q4k => QualityTier::UHD4K,
            QualityFilter::Q1080p => QualityTier::FHD1080p,
            QualityFilter::Q720p => QualityTier::HD720p,
        }
    }
}

impl std::fmt::Display for QualityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityFilter::Q4k => write!(f, "4K"),
            QualityFilter::Q1080p => write!(f, "1080p"),
            QualityFilter::Q720p => write!(f, "720p"),
        }
    }
}

// =============================================================================
// Play Command
// =============================================================================

/// Pick a candidate by index and produce a playback instruction
#[derive(Args, Debug)]
pub struct PlayCmd {
    #[command(flatten)]
    pub title: TitleArgs,

    /// Candidate index from `streams` output (default: recommended server)
    #[arg(long, short = 'i', default_value = "0")]
    pub index: usize,

    /// Hand torrents to an external client instead of resolving them
    #[arg(long)]
    pub handoff: bool,
}

// =============================================================================
// Resolve Command
// =============================================================================

/// Resolve a magnet link into a direct URL
#[derive(Args, Debug)]
pub struct ResolveCmd {
    /// Magnet link URL
    #[arg(required = true)]
    pub magnet: String,
}

// =============================================================================
// Watchlist Command
// =============================================================================

#[derive(Args, Debug)]
pub struct WatchlistCmd {
    #[command(subcommand)]
    pub action: WatchlistAction,
}

#[derive(Subcommand, Debug)]
pub enum WatchlistAction {
    /// Show saved titles, newest first
    #[command(visible_alias = "ls")]
    List,

    /// Save a title
    Add(WatchlistAddCmd),

    /// Remove a title
    #[command(visible_alias = "rm")]
    Remove {
        /// Media id
        id: String,
    },

    /// Check whether a title is saved
    Contains {
        /// Media id
        id: String,
    },
}

/// Save a title to the watchlist
#[derive(Args, Debug)]
pub struct WatchlistAddCmd {
    /// Media id (TMDB)
    #[arg(required = true)]
    pub id: String,

    /// Display title
    #[arg(long, short = 't', required = true)]
    pub title: String,

    /// Media type
    #[arg(long, short = 'm', value_enum, default_value = "movie")]
    pub media_type: MediaTypeArg,

    /// Release date (YYYY-MM-DD)
    #[arg(long)]
    pub release_date: Option<String>,
}

/// Media type for watchlist entries
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTypeArg {
    /// Movie
    Movie,
    /// TV show
    Tv,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> MediaType {
        match arg {
            MediaTypeArg::Movie => MediaType::Movie,
            MediaTypeArg::Tv => MediaType::Tv,
        }
    }
}

// =============================================================================
// JSON Output Structures
// =============================================================================

/// JSON output wrapper for consistent formatting
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print human-readable lines, or the data as JSON
    pub fn print_lines<T: Serialize>(&self, data: T, lines: &[String]) -> anyhow::Result<()> {
        if self.json {
            return self.print(data);
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// ID Validation
// =============================================================================

/// Validate IMDB ID format (tt followed by digits)
pub fn validate_imdb_id(id: &str) -> Result<&str, &'static str> {
    if id.starts_with("tt") && id.len() >= 9 && id[2..].chars().all(|c| c.is_ascii_digit()) {
        Ok(id)
    } else {
        Err("Invalid IMDB ID format (expected tt followed by 7+ digits)")
    }
}

/// Validate a magnet URI
pub fn validate_magnet(uri: &str) -> Result<&str, &'static str> {
    if uri.starts_with("magnet:?") && uri.contains("xt=urn:btih:") {
        Ok(uri)
    } else {
        Err("Invalid magnet link (expected magnet:?xt=urn:btih:...)")
    }
}

// =============================================================================
// Tests
// =============================================================================
