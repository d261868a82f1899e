//! The event loop that drives the transport.
//!
//! One current-thread task owns the controller. Clock ticks, remote polls,
//! stdin commands and finished lyric lookups are multiplexed with
//! `tokio::select!`, and backend events are pumped after every wake-up.

use std::rc::Rc;
use std::time::Duration;

use duet_core::{format_time, TrackKind};
use duet_lyrics::{FetchTicket, LyricsOutcome, LyricsResolver, LyricsStatus};
use duet_playback::{
    LoadPhase, LocalAudioBackend, PlaybackState, RemoteStreamBackend, TransportController,
};
use duet_search::{SearchOutcome, SearchService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::commands::Command;
use super::demo::{demo_playlist, DemoMedia, DemoSearch, SimulatedPlayer, StaticLyrics};
use crate::config::AppConfig;

/// Keys handed to the demo search API. The first one is always rejected.
const DEMO_SEARCH_KEYS: &str = "exhausted-0001,demo-0002";

type LyricsResult = (FetchTicket, LyricsOutcome);

/// Run the transport until the configured deadline or a `quit` command.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let transport_config = config.transport.clone();
    let remote = RemoteStreamBackend::new(SimulatedPlayer::new(), &transport_config);
    let local = LocalAudioBackend::new(DemoMedia);
    let mut transport = TransportController::new(transport_config, local, remote);

    let resolver = Rc::new(LyricsResolver::new(StaticLyrics));
    let search = SearchService::from_key_list(DemoSearch, DEMO_SEARCH_KEYS);
    let (lyrics_tx, mut lyrics_rx) = mpsc::unbounded_channel::<LyricsResult>();

    transport.add_tracks(demo_playlist(), true);

    let mut tick = interval(transport.config().tick_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut poll = interval(transport.config().poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = sleep(Duration::from_secs(config.demo_seconds));
    tokio::pin!(deadline);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_tick = Instant::now();
    let mut reporter = StatusReporter::default();

    info!(
        "Driving {} tracks for {}s (type commands, `quit` to stop)",
        transport.catalog().len(),
        config.demo_seconds
    );

    loop {
        tokio::select! {
            now = tick.tick() => {
                transport.advance(now.duration_since(last_tick));
                last_tick = now;
            }
            _ = poll.tick() => {
                if transport.poll_interval().is_some() {
                    transport.poll();
                }
            }
            Some((ticket, outcome)) = lyrics_rx.recv() => {
                if !transport.apply_lyrics(&ticket, outcome) {
                    debug!("Dropped lyrics for {} - {}", ticket.artist, ticket.title);
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => execute(&mut transport, &search, command).await,
                    Err(e) => warn!("{e}"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    stdin_open = false;
                }
            },
            () = &mut deadline => {
                info!("Run time elapsed");
                break;
            }
        }

        transport.pump_events();

        if let Some(ticket) = transport.take_lyrics_request() {
            spawn_lyrics_lookup(Rc::clone(&resolver), ticket, lyrics_tx.clone());
        }
        reporter.observe(&transport);
    }

    reporter.summary(&transport);
    Ok(())
}

/// Resolve lyrics in the background. The ticket travels with the result so a
/// late answer for a previous track is discarded.
fn spawn_lyrics_lookup(
    resolver: Rc<LyricsResolver<StaticLyrics>>,
    ticket: FetchTicket,
    tx: mpsc::UnboundedSender<LyricsResult>,
) {
    tokio::task::spawn_local(async move {
        let outcome = resolver.resolve(&ticket.artist, &ticket.title).await;
        let _ = tx.send((ticket, outcome));
    });
}

async fn execute(
    transport: &mut TransportController,
    search: &SearchService<DemoSearch>,
    command: Command,
) {
    debug!("Command: {command:?}");
    match command {
        Command::Play => transport.play(),
        Command::Pause => transport.pause(),
        Command::Toggle => transport.toggle(),
        Command::Next => transport.next(),
        Command::Previous => transport.previous(),
        Command::CycleLoop => {
            let mode = transport.cycle_loop_mode();
            info!("Loop mode: {}", mode.as_str());
        }
        Command::BoundaryA => transport.set_boundary_a(),
        Command::BoundaryB => transport.set_boundary_b(),
        Command::ClearRegion => transport.clear_region(),
        Command::Region(start, end) => transport.update_region(start, end),
        Command::Seek(seconds) => transport.seek(seconds),
        Command::Skip(delta) => transport.skip(delta),
        Command::Rate(rate) => {
            if let Err(e) = transport.set_playback_rate(rate) {
                warn!("{e}");
            }
        }
        Command::Volume(volume) => transport.set_volume(volume),
        Command::Select(index) => {
            if let Err(e) = transport.select_track(index) {
                warn!("{e}");
            }
        }
        Command::Search(query) => match search.search(&query, transport.catalog()).await {
            SearchOutcome::Found(results) => {
                let remote: Vec<_> = results
                    .into_iter()
                    .filter(|t| t.kind == TrackKind::Remote)
                    .collect();
                info!("Search {query:?}: adding {} remote results", remote.len());
                transport.add_tracks(remote, false);
            }
            SearchOutcome::Failed(reason) => warn!("Search {query:?} failed: {reason}"),
        },
        Command::Online(online) => transport.set_online(online),
        Command::RetryLyrics => transport.retry_lyrics(),
        Command::Status => log_status(transport),
        Command::Quit => {}
    }
}

fn log_status(transport: &TransportController) {
    let state = transport.state();
    let title = transport
        .current_track()
        .map_or("-", |track| track.title.as_str());
    info!(
        "[{}] {} {} / {} ({:.0}%) rate {:.2}x vol {:.0}% loop {}{}",
        if state.is_playing { "playing" } else { "paused" },
        title,
        format_time(state.current_time),
        format_time(state.duration),
        state.progress() * 100.0,
        state.playback_rate,
        state.volume.as_percentage(),
        state.loop_mode.as_str(),
        transport
            .region()
            .map(|r| format!(" region {}-{}", format_time(r.start()), format_time(r.end())))
            .unwrap_or_default(),
    );
}

/// Logs transport changes as they happen.
#[derive(Default)]
struct StatusReporter {
    last: Option<PlaybackState>,
    lyric: Option<usize>,
}

impl StatusReporter {
    fn observe(&mut self, transport: &TransportController) {
        let state = transport.state();
        let previous = self.last.replace(state.clone());

        let track_changed = previous.as_ref().map(|p| p.position) != Some(state.position);
        let load_changed = previous.as_ref().map(|p| p.load) != Some(state.load);
        let playing_changed = previous.as_ref().map(|p| p.is_playing) != Some(state.is_playing);

        if track_changed || load_changed {
            match state.load {
                LoadPhase::Ready => log_status(transport),
                LoadPhase::Failed => warn!(
                    "Could not load track: {}",
                    state.last_error.as_deref().unwrap_or("unknown error")
                ),
                LoadPhase::Idle | LoadPhase::Loading => {}
            }
        } else if playing_changed {
            log_status(transport);
        }

        let lyric = transport.active_lyric_index();
        if lyric != self.lyric || track_changed {
            self.lyric = lyric;
            if let (Some(index), LyricsStatus::Ready(sync)) = (lyric, transport.lyrics_status()) {
                if let Some(line) = sync.lines().get(index) {
                    info!("  {} | {}", format_time(line.time), line.text);
                }
            }
        }
    }

    fn summary(&self, transport: &TransportController) {
        log_status(transport);
        if let LyricsStatus::NotFound(reason) = transport.lyrics_status() {
            info!("Lyrics: {reason}");
        }
    }
}
