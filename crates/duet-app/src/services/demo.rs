//! In-memory collaborators used by the headless driver.
//!
//! They stand in for the decoder, the embedded remote player, the lyrics
//! database and the search API so the transport can run end to end without
//! audio hardware or network access.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use duet_core::{Error, Result, TrackDescriptor};
use duet_lyrics::{LyricsProvider, LyricsRecord};
use duet_playback::{LocalMedia, PlayerSnapshot, RemotePlayer, RemoteState};
use duet_search::SearchProvider;
use parking_lot::Mutex;
use tracing::debug;

struct DemoTrack {
    title: &'static str,
    artist: &'static str,
    source_ref: &'static str,
    remote: bool,
    duration: f64,
    lyrics: &'static str,
}

const LIBRARY: &[DemoTrack] = &[
    DemoTrack {
        title: "Morning Light",
        artist: "",
        source_ref: "music/morning-light.flac",
        remote: false,
        duration: 14.0,
        lyrics: concat!(
            "[00:00.50]Wake up slow\n[00:04.00]Sun on the floor\n",
            "[00:08.25]Nothing to prove\n[00:11.00]",
        ),
    },
    DemoTrack {
        title: "Tidal",
        artist: "Harbour",
        source_ref: "music/tidal.mp3",
        remote: false,
        duration: 12.0,
        lyrics: "",
    },
    DemoTrack {
        title: "Night Drive (Official Video)",
        artist: "Synth Collective",
        source_ref: "vid-night-drive",
        remote: true,
        duration: 16.0,
        lyrics: "[00:01.00]Headlights on the overpass\n[00:06.00]City hum\n[00:11.50]Keep driving",
    },
    DemoTrack {
        title: "Synth Collective - Afterglow",
        artist: "SynthCollectiveVEVO",
        source_ref: "vid-afterglow",
        remote: true,
        duration: 10.0,
        lyrics: "[00:00.00]Afterglow\n[00:05.00]Fading in",
    },
];

/// The starting playlist: the local files of the demo library.
pub fn demo_playlist() -> Vec<TrackDescriptor> {
    LIBRARY
        .iter()
        .filter(|t| !t.remote)
        .map(|t| {
            TrackDescriptor::local(t.title, t.source_ref)
                .with_artist(t.artist)
                .with_duration_hint(t.duration)
        })
        .collect()
}

fn duration_of(source_ref: &str, remote: bool) -> Option<f64> {
    LIBRARY
        .iter()
        .find(|t| t.remote == remote && t.source_ref == source_ref)
        .map(|t| t.duration)
}

/// Local "decoder" that knows the durations of the demo files.
#[derive(Debug, Default)]
pub struct DemoMedia;

impl LocalMedia for DemoMedia {
    fn open(&mut self, source_ref: &str) -> Result<f64> {
        duration_of(source_ref, false).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{source_ref} does not exist"),
            ))
        })
    }
}

#[derive(Debug, Default)]
struct PlayerInner {
    duration: f64,
    state: RemoteState,
    /// Position when the clock last stopped.
    offset: f64,
    started: Option<Instant>,
    volume_percent: f32,
}

impl PlayerInner {
    fn position(&self) -> f64 {
        let running = self.started.map_or(0.0, |at| at.elapsed().as_secs_f64());
        (self.offset + running).min(self.duration)
    }

    fn stop_clock(&mut self) {
        self.offset = self.position();
        self.started = None;
    }
}

/// Remote player that keeps its own wall-clock playhead.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<PlayerInner>>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemotePlayer for SimulatedPlayer {
    fn cue(&mut self, video_id: &str) -> Result<()> {
        let duration = duration_of(video_id, true)
            .ok_or_else(|| Error::Backend(format!("video {video_id} is unavailable")))?;

        let mut inner = self.inner.lock();
        inner.duration = duration;
        inner.state = RemoteState::Cued;
        inner.offset = 0.0;
        inner.started = None;
        debug!("Cued {video_id}");
        Ok(())
    }

    fn play(&mut self) {
        let mut inner = self.inner.lock();
        if inner.state == RemoteState::Ended {
            inner.offset = 0.0;
        }
        if inner.started.is_none() {
            inner.started = Some(Instant::now());
        }
        inner.state = RemoteState::Playing;
    }

    fn pause(&mut self) {
        let mut inner = self.inner.lock();
        inner.stop_clock();
        if inner.state == RemoteState::Playing {
            inner.state = RemoteState::Paused;
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        let mut inner = self.inner.lock();
        inner.offset = seconds.clamp(0.0, inner.duration);
        if inner.started.is_some() {
            inner.started = Some(Instant::now());
        }
        if inner.state == RemoteState::Ended {
            inner.state = RemoteState::Paused;
        }
    }

    fn set_volume(&mut self, percent: f32) {
        self.inner.lock().volume_percent = percent.clamp(0.0, 100.0);
    }

    fn snapshot(&self) -> PlayerSnapshot {
        let mut inner = self.inner.lock();
        if inner.state == RemoteState::Playing && inner.position() >= inner.duration {
            inner.stop_clock();
            inner.state = RemoteState::Ended;
        }

        PlayerSnapshot {
            state: inner.state,
            current_time: inner.position(),
            duration: inner.duration,
            volume_percent: inner.volume_percent,
        }
    }
}

/// Lyrics database backed by the demo library.
#[derive(Debug, Default)]
pub struct StaticLyrics;

fn record_for(track: &DemoTrack) -> Option<LyricsRecord> {
    (!track.lyrics.is_empty()).then(|| LyricsRecord {
        synced_lyrics: Some(track.lyrics.to_string()),
        plain_lyrics: None,
    })
}

impl LyricsProvider for StaticLyrics {
    async fn get(&self, _artist: &str, title: &str) -> Result<Option<LyricsRecord>> {
        Ok(LIBRARY
            .iter()
            .find(|t| t.title.eq_ignore_ascii_case(title))
            .and_then(record_for))
    }

    async fn search(&self, query: &str) -> Result<Vec<LyricsRecord>> {
        let query = query.to_lowercase();
        Ok(LIBRARY
            .iter()
            .filter(|t| query.contains(&duet_lyrics::clean_title(t.title).to_lowercase()))
            .filter_map(record_for)
            .collect())
    }
}

/// Search API over the remote half of the demo library.
#[derive(Debug, Default)]
pub struct DemoSearch;

impl SearchProvider for DemoSearch {
    async fn search(&self, query: &str, api_key: &str) -> Result<Vec<TrackDescriptor>> {
        if api_key.starts_with("exhausted") {
            return Err(Error::QuotaExceeded {
                key_hint: duet_search::key_hint(api_key).to_string(),
            });
        }

        let query = query.to_lowercase();
        Ok(LIBRARY
            .iter()
            .filter(|t| t.remote)
            .filter(|t| {
                t.title.to_lowercase().contains(&query) || t.artist.to_lowercase().contains(&query)
            })
            .map(|t| {
                TrackDescriptor::remote(t.title, t.artist, t.source_ref)
                    .with_duration_hint(t.duration)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use duet_lyrics::{LyricsOutcome, LyricsResolver};

    #[test]
    fn test_playlist_is_local_only() {
        let playlist = demo_playlist();
        assert_eq!(playlist.len(), 2);
        assert!(playlist.iter().all(|t| t.duration_hint.is_some()));
    }

    #[test]
    fn test_media_rejects_unknown_files() {
        let mut media = DemoMedia;
        assert!((media.open("music/tidal.mp3").unwrap() - 12.0).abs() < f64::EPSILON);
        assert!(media.open("music/missing.wav").is_err());
    }

    #[test]
    fn test_player_pause_and_seek() {
        let mut player = SimulatedPlayer::new();
        assert!(player.cue("nope").is_err());
        player.cue("vid-afterglow").unwrap();
        assert_eq!(player.snapshot().state, RemoteState::Cued);

        player.seek_to(4.0);
        player.play();
        player.pause();
        let snapshot = player.snapshot();
        assert_eq!(snapshot.state, RemoteState::Paused);
        assert!(snapshot.current_time >= 4.0);
        assert!((snapshot.duration - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_player_reports_end() {
        let mut player = SimulatedPlayer::new();
        player.cue("vid-afterglow").unwrap();
        player.seek_to(10.0);
        player.play();
        assert_eq!(player.snapshot().state, RemoteState::Ended);
    }

    #[tokio::test]
    async fn test_lyrics_resolve_noisy_title() {
        let resolver = LyricsResolver::new(StaticLyrics);
        let outcome = resolver
            .resolve("SynthCollectiveVEVO", "Synth Collective - Afterglow")
            .await;
        assert!(outcome.is_found());

        let missing = resolver.resolve("Harbour", "Tidal").await;
        assert_eq!(missing, LyricsOutcome::not_found("Lyrics not found"));
    }

    #[tokio::test]
    async fn test_search_rotates_keys() {
        let service = duet_search::SearchService::from_key_list(DemoSearch, "exhausted-1,demo");
        let outcome = service.search("night", &duet_core::TrackCatalog::new()).await;
        assert_eq!(outcome.results().len(), 1);
    }
}
