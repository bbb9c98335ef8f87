//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the resolution engine.
//! Each handler takes CLI args and Output, returns ExitCode.

use serde::Serialize;

use crate::cli::{
    validate_magnet, ExitCode, Output, PlayCmd, ResolveCmd, StreamsCmd, WatchlistAction,
    WatchlistCmd,
};
use kino::config::Config;
use kino::models::{Aggregation, PlaybackInstruction, StreamCandidate, TitleRef, TorrentListing};
use kino::watchlist::{Watchlist, WatchlistEntry};
use kino::ResolutionOrchestrator;

// =============================================================================
// Streams Command
// =============================================================================

#[derive(Serialize)]
struct IndexedCandidate {
    index: usize,
    #[serde(flatten)]
    candidate: StreamCandidate,
}

#[derive(Serialize)]
struct StreamsReport {
    title: TitleRef,
    candidates: Vec<IndexedCandidate>,
    /// "loaded", "failed" or "unavailable"
    torrents: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    torrent_error: Option<String>,
}

pub async fn streams_cmd(cmd: StreamsCmd, config: &Config, output: &Output) -> ExitCode {
    let title = match cmd.title.title_ref() {
        Ok(title) => title,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let orchestrator = ResolutionOrchestrator::from_config(config);

    output.info(format!("Finding streams for: {}", title));

    let aggregation = match orchestrator.aggregate(&title).await {
        Ok(aggregation) => aggregation,
        Err(e) => return output.error(e.to_string(), ExitCode::from(&e)),
    };

    // Indices always refer to the unfiltered list so `play -i` matches
    let embed_count = aggregation.embeds.len();
    let mut candidates: Vec<IndexedCandidate> = aggregation
        .candidates()
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| IndexedCandidate { index, candidate })
        .collect();

    if let Some(filter) = cmd.quality {
        let min = filter.min_tier().rank();
        candidates.retain(|c| !c.candidate.is_torrent() || c.candidate.quality_tier.rank() >= min);
    }
    candidates.truncate(embed_count + cmd.limit);

    let (torrents, torrent_error) = match &aggregation.torrents {
        TorrentListing::Loaded(_) | TorrentListing::Loading => ("loaded", None),
        TorrentListing::Failed(msg) => ("failed", Some(msg.clone())),
        TorrentListing::Unavailable => ("unavailable", None),
    };

    if let Some(msg) = &torrent_error {
        output.info(format!("Torrent mirrors unavailable: {}", msg));
    } else if aggregation.torrents.candidates().is_empty() && torrents == "loaded" {
        output.info("No torrent streams found for this title. Try an instant server.");
    }

    let lines: Vec<String> = candidates
        .iter()
        .map(|c| format!("{:>3}  {}", c.index, c.candidate))
        .collect();
    let report = StreamsReport {
        title,
        candidates,
        torrents,
        torrent_error,
    };

    if let Err(e) = output.print_lines(&report, &lines) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Play Command
// =============================================================================

#[derive(Serialize)]
struct PlayReport {
    candidate: StreamCandidate,
    playback: PlaybackInstruction,
}

pub async fn play_cmd(cmd: PlayCmd, config: &Config, output: &Output) -> ExitCode {
    let title = match cmd.title.title_ref() {
        Ok(title) => title,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let orchestrator = ResolutionOrchestrator::from_config(config);

    let aggregation: Aggregation = match orchestrator.aggregate(&title).await {
        Ok(aggregation) => aggregation,
        Err(e) => return output.error(e.to_string(), ExitCode::from(&e)),
    };

    let candidate = match aggregation.candidates().into_iter().nth(cmd.index) {
        Some(candidate) => candidate,
        None => {
            return output.error(
                format!(
                    "No stream at index {} ({} available)",
                    cmd.index,
                    aggregation.len()
                ),
                ExitCode::NoStreams,
            )
        }
    };

    let playback = if cmd.handoff {
        orchestrator.handoff(&candidate)
    } else {
        if candidate.is_torrent() {
            output.info(format!("Resolving via Real-Debrid: {}", candidate.label));
        }
        match orchestrator.select_candidate(&candidate).await {
            Ok(playback) => playback,
            Err(e) => return output.error(e.to_string(), ExitCode::from(&e)),
        }
    };

    let lines = vec![playback.to_string()];
    let report = PlayReport {
        candidate,
        playback,
    };
    if let Err(e) = output.print_lines(&report, &lines) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }
    ExitCode::Success
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, config: &Config, output: &Output) -> ExitCode {
    let magnet = match validate_magnet(&cmd.magnet) {
        Ok(magnet) => magnet,
        Err(e) => return output.error(e, ExitCode::InvalidArgs),
    };
    let orchestrator = ResolutionOrchestrator::from_config(config);
    if !orchestrator.can_resolve() {
        let e = kino::ResolveError::missing_credential();
        return output.error(e.to_string(), ExitCode::from(&e));
    }

    output.info("Resolving via Real-Debrid...");

    match orchestrator.resolve(&StreamCandidate::magnet(magnet)).await {
        Ok(playback) => {
            let lines = vec![playback.url().to_string()];
            if let Err(e) = output.print_lines(&playback, &lines) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), ExitCode::from(&e)),
    }
}

// =============================================================================
// Watchlist Command
// =============================================================================

#[derive(Serialize)]
struct ContainsReport<'a> {
    id: &'a str,
    saved: bool,
}

pub fn watchlist_cmd(cmd: WatchlistCmd, config: &Config, output: &Output) -> ExitCode {
    let watchlist = Watchlist::open(config.watchlist_path());

    let result = match cmd.action {
        WatchlistAction::List => {
            let entries = watchlist.list();
            let lines: Vec<String> = entries
                .iter()
                .map(|e| format!("{:>8}  {} [{}]", e.id, e.title, e.media_type))
                .collect();
            output.print_lines(&entries, &lines)
        }
        WatchlistAction::Add(add) => {
            let entry = WatchlistEntry {
                id: add.id,
                title: add.title,
                media_type: add.media_type.into(),
                poster_path: None,
                release_date: add.release_date,
                vote_average: None,
            };
            match watchlist.add(entry.clone()) {
                Ok(true) => output.print_lines(&entry, &[format!("Added {}", entry.title)]),
                Ok(false) => {
                    output.info(format!("{} is already on the watchlist", entry.title));
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        WatchlistAction::Remove { id } => match watchlist.remove(&id) {
            Ok(true) => output.print_lines(&id, &[format!("Removed {}", id)]),
            Ok(false) => {
                return output.error(
                    format!("{} is not on the watchlist", id),
                    ExitCode::NotFound,
                )
            }
            Err(e) => Err(e),
        },
        WatchlistAction::Contains { id } => {
            let saved = watchlist.contains(&id);
            let report = ContainsReport { id: &id, saved };
            output.print_lines(&report, &[saved.to_string()])
        }
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Watchlist error: {:#}", e), ExitCode::Error),
    }
}
