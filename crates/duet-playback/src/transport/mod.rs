//! Transport controller: the single public surface over both backends.
//!
//! The controller owns the catalog, the playback state and the loop region.
//! Backends report through a channel; every event carries the generation of
//! the subscription that produced it, and [`TransportController::pump_events`]
//! drops anything from an earlier generation. A track change bumps the
//! generation only after the outgoing backend has been detached, so two
//! backends can never write into the same state.

mod state;

pub use state::{LoadPhase, PlaybackState};

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use duet_core::{
    clamp_time, next_index, resolve, Direction, Error, Generation, LoopMode, Result, Track,
    TrackCatalog, TrackDescriptor, TrackKind, Volume,
};
use duet_lyrics::{FetchTicket, LyricsOutcome, LyricsStatus, LyricsTracker};
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendEvent, Capabilities, Envelope, EventSink};
use crate::config::TransportConfig;
use crate::region::{LoopRegion, LoopRegionManager, RegionChange};

type BoxedBackend = Box<dyn Backend + Send>;

/// Drives one playhead across a local and a remote backend.
pub struct TransportController {
    config: TransportConfig,
    catalog: TrackCatalog,
    state: PlaybackState,
    local: BoxedBackend,
    remote: BoxedBackend,
    active: Option<TrackKind>,
    generation: Generation,
    events_tx: Sender<Envelope>,
    events_rx: Receiver<Envelope>,
    regions: LoopRegionManager,
    lyrics: LyricsTracker,
    pending_lyrics: Option<FetchTicket>,
    /// Start playback when the loading track reports ready.
    autoplay: bool,
    /// Rate chosen by the user; re-applied to rate-capable backends.
    requested_rate: f64,
    online: bool,
}

impl TransportController {
    pub fn new(
        config: TransportConfig,
        local: impl Backend + Send + 'static,
        remote: impl Backend + Send + 'static,
    ) -> Self {
        let (events_tx, events_rx) = unbounded();
        let state = PlaybackState::new(config.initial_volume());
        let regions = LoopRegionManager::new(config.default_region_span_secs);

        Self {
            config,
            catalog: TrackCatalog::new(),
            state,
            local: Box::new(local),
            remote: Box::new(remote),
            active: None,
            generation: Generation::INITIAL,
            events_tx,
            events_rx,
            regions,
            lyrics: LyricsTracker::new(),
            pending_lyrics: None,
            autoplay: false,
            requested_rate: 1.0,
            online: true,
        }
    }

    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub const fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub const fn generation(&self) -> Generation {
        self.generation
    }

    pub const fn active_kind(&self) -> Option<TrackKind> {
        self.active
    }

    pub const fn is_online(&self) -> bool {
        self.online
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.position.and_then(|index| self.catalog.get(index))
    }

    pub const fn region(&self) -> Option<LoopRegion> {
        self.regions.region()
    }

    /// Whether region gestures currently do anything.
    pub const fn region_enabled(&self) -> bool {
        self.regions.is_enabled()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.active_ref().map(|b| b.capabilities()).unwrap_or_default()
    }

    fn active_ref(&self) -> Option<&(dyn Backend + Send)> {
        match self.active? {
            TrackKind::Local => Some(self.local.as_ref()),
            TrackKind::Remote => Some(self.remote.as_ref()),
        }
    }

    fn active_mut(&mut self) -> Option<&mut BoxedBackend> {
        match self.active? {
            TrackKind::Local => Some(&mut self.local),
            TrackKind::Remote => Some(&mut self.remote),
        }
    }

    // ---- Catalog ----

    /// Append one track and return its index.
    pub fn add_track(&mut self, descriptor: TrackDescriptor) -> usize {
        let index = self.catalog.push(descriptor);
        info!("Added track {} at index {index}", self.catalog.tracks()[index].title);
        index
    }

    /// Append a batch sorted by title. With `autoplay`, select the first new
    /// track. Returns the index of the first new track.
    pub fn add_tracks(&mut self, batch: Vec<TrackDescriptor>, autoplay: bool) -> Option<usize> {
        let count = batch.len();
        let first = self.catalog.extend_sorted(batch)?;
        info!("Added {count} tracks starting at index {first}");

        if autoplay {
            if let Err(e) = self.select_track(first) {
                warn!("Failed to select added track: {e}");
            }
        }
        Some(first)
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        }
        self.online = online;
    }

    // ---- Transport ----

    /// Activate the track at `index`.
    ///
    /// The outgoing backend is torn down before the incoming one is attached.
    /// Load failures do not return an error; they leave the track selected
    /// and paused with the reason in [`PlaybackState::last_error`].
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        let Some(track) = self.catalog.get(index).cloned() else {
            return Err(Error::InvalidArgument(format!(
                "Track index {index} out of range (catalog has {})",
                self.catalog.len()
            )));
        };

        if let Some(outgoing) = self.active_mut() {
            if let Some(region_loop) = outgoing.region_loop() {
                region_loop.set_region(None);
            }
            outgoing.pause();
            outgoing.detach();
        }

        let generation = self.generation.bump();
        self.regions.clear();
        self.state.begin_load(index, track.duration_hint);
        self.autoplay = true;
        self.active = Some(track.kind);
        info!(
            "Selecting track {index}: {} - {} ({}, {generation})",
            track.artist,
            track.title,
            track.kind.as_str()
        );

        let sink = EventSink::new(self.events_tx.clone(), generation);
        let rate = self.requested_rate;
        let volume = self.state.volume;
        let online = self.online;
        let incoming = match track.kind {
            TrackKind::Local => &mut self.local,
            TrackKind::Remote => &mut self.remote,
        };

        incoming.attach(sink);
        let capabilities = incoming.capabilities();
        if let Some(rate_control) = incoming.rate_control() {
            rate_control.set_playback_rate(rate);
        }
        if let Some(volume_control) = incoming.volume_control() {
            volume_control.set_volume(volume);
        }
        let loaded = if track.is_remote() && !online {
            Err(Error::Offline)
        } else {
            incoming.load(&track)
        };

        self.regions.set_enabled(capabilities.region_loop);
        self.state.playback_rate = if capabilities.playback_rate { rate } else { 1.0 };
        if let Err(e) = loaded {
            self.fail_load(&e.to_string());
        }

        let (artist, title) = track.lyrics_key();
        if let Some(ticket) = self.lyrics.track_changed(artist, title) {
            self.pending_lyrics = Some(ticket);
        }
        Ok(())
    }

    /// Start or resume playback. Selects the first track when nothing is
    /// selected, and reloads a track whose load failed.
    pub fn play(&mut self) {
        let Some(index) = self.state.position else {
            if !self.catalog.is_empty() {
                if let Err(e) = self.select_track(0) {
                    warn!("Failed to select first track: {e}");
                }
            }
            return;
        };

        match self.state.load {
            LoadPhase::Loading => self.autoplay = true,
            LoadPhase::Failed | LoadPhase::Idle => {
                if let Err(e) = self.select_track(index) {
                    warn!("Failed to reload track {index}: {e}");
                }
            }
            LoadPhase::Ready => {
                if let Some(backend) = self.active_mut() {
                    backend.play();
                    self.state.is_playing = true;
                }
            }
        }
    }

    pub fn pause(&mut self) {
        self.autoplay = false;
        if let Some(backend) = self.active_mut() {
            backend.pause();
        }
        self.state.is_playing = false;
    }

    pub fn toggle(&mut self) {
        if self.state.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move the playhead to `seconds`, clamped to the track.
    pub fn seek(&mut self, seconds: f64) {
        let target = clamp_time(seconds, self.state.duration);
        let Some(backend) = self.active_mut() else {
            return;
        };
        backend.seek(target);
        self.state.current_time = target;
    }

    pub fn skip(&mut self, delta: f64) {
        self.seek(self.state.current_time + delta);
    }

    pub fn skip_forward(&mut self) {
        self.skip(self.config.skip_step_secs);
    }

    pub fn skip_backward(&mut self) {
        self.skip(-self.config.skip_step_secs);
    }

    /// Set the playback rate. A backend without rate control ignores it, but
    /// the rate is remembered for the next one that has it.
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Playback rate must be positive, got {rate}"
            )));
        }
        self.requested_rate = rate;

        if let Some(control) = self.active_mut().and_then(|backend| backend.rate_control()) {
            control.set_playback_rate(rate);
            self.state.playback_rate = rate;
        } else {
            debug!("Active backend has no rate control, remembering {rate}x");
        }
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = Volume::new(volume);
        self.state.volume = volume;
        if let Some(control) = self.active_mut().and_then(|backend| backend.volume_control()) {
            control.set_volume(volume);
        }
    }

    pub fn next(&mut self) {
        self.step(Direction::Next);
    }

    pub fn previous(&mut self) {
        self.step(Direction::Previous);
    }

    fn step(&mut self, direction: Direction) {
        let target = resolve(
            self.catalog.len(),
            self.state.position,
            self.state.loop_mode,
            direction,
        );

        match target {
            Some(index) if Some(index) == self.state.position => self.restart(),
            Some(index) => {
                if let Err(e) = self.select_track(index) {
                    warn!("Failed to select track {index}: {e}");
                }
            }
            None => {
                debug!("Reached end of playlist, stopping");
                self.pause();
            }
        }
    }

    /// Advance the loop mode `off -> all -> one -> off`. Returning to `off`
    /// removes the loop region.
    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        let mode = self.state.loop_mode.cycled();
        self.state.loop_mode = mode;
        debug!("Loop mode: {}", mode.as_str());
        if mode == LoopMode::Off {
            self.clear_region();
        }
        mode
    }

    fn restart(&mut self) {
        self.seek(0.0);
        self.play();
    }

    fn fail_load(&mut self, reason: &str) {
        warn!("Load failed: {reason}");
        self.state.load = LoadPhase::Failed;
        self.state.is_playing = false;
        self.state.last_error = Some(reason.to_string());
        self.autoplay = false;
    }

    // ---- Loop region ----

    pub fn set_boundary_a(&mut self) {
        let change = self
            .regions
            .set_boundary_a(self.state.current_time, self.state.duration);
        self.apply_region_change(change);
    }

    pub fn set_boundary_b(&mut self) {
        let change = self
            .regions
            .set_boundary_b(self.state.current_time, self.state.duration);
        self.apply_region_change(change);
    }

    /// Finish a drag or resize of the region.
    pub fn update_region(&mut self, start: f64, end: f64) {
        let change = self.regions.update(start, end, self.state.duration);
        self.apply_region_change(change);
    }

    pub fn clear_region(&mut self) {
        let change = self.regions.clear();
        self.apply_region_change(change);
    }

    fn apply_region_change(&mut self, change: RegionChange) {
        let (region, restart) = match change {
            RegionChange::Unchanged => return,
            RegionChange::Updated(region) => (Some(region), false),
            RegionChange::Restart(region) => (Some(region), true),
            RegionChange::Cleared => (None, false),
        };

        if let Some(region_loop) = self.active_mut().and_then(|backend| backend.region_loop()) {
            region_loop.set_region(region);
        }
        if let (Some(region), true) = (region, restart) {
            self.seek(region.start());
            self.play();
        }
    }

    // ---- Event pumping ----

    /// Move a push-driven backend's clock forward.
    pub fn advance(&mut self, elapsed: Duration) {
        if let Some(backend) = self.active_mut() {
            backend.advance(elapsed);
        }
    }

    /// Sample a polled backend.
    pub fn poll(&mut self) {
        if let Some(backend) = self.active_mut() {
            backend.poll();
        }
    }

    /// Poll cadence of the active backend, if it needs polling.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.active_ref().and_then(|backend| backend.poll_interval())
    }

    /// Apply every queued backend event. Returns how many were applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.events_rx.try_recv() {
            if self.apply(envelope) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one backend event. Returns false when the event belongs to a
    /// superseded generation and was discarded.
    pub fn apply(&mut self, envelope: Envelope) -> bool {
        if !envelope.generation.is_current(self.generation) {
            debug!(
                "Discarding {:?} from {} (active {})",
                envelope.event, envelope.generation, self.generation
            );
            return false;
        }

        match envelope.event {
            BackendEvent::Ready { duration } => self.on_ready(duration),
            BackendEvent::TimeUpdate(time) => {
                self.state.current_time = clamp_time(time, self.state.duration);
            }
            BackendEvent::DurationChanged(duration) => {
                if duration.is_finite() && duration > 0.0 {
                    self.state.duration = duration;
                }
            }
            BackendEvent::Ended => self.on_ended(),
            BackendEvent::Error(reason) => self.on_error(reason),
            BackendEvent::VolumeChanged(volume) => self.state.volume = volume,
            BackendEvent::PlayingChanged(playing) => self.state.is_playing = playing,
        }
        true
    }

    fn on_ready(&mut self, duration: f64) {
        if duration.is_finite() && duration > 0.0 {
            self.state.duration = duration;
        }
        self.state.load = LoadPhase::Ready;
        debug!("Track ready ({:.2}s)", self.state.duration);

        if std::mem::take(&mut self.autoplay) {
            self.play();
        }
    }

    /// Natural end of the active track.
    fn on_ended(&mut self) {
        let Some(current) = self.state.position else {
            return;
        };
        debug!("Track {current} ended (loop {})", self.state.loop_mode.as_str());

        if self.state.loop_mode == LoopMode::One {
            self.restart();
            return;
        }

        match next_index(self.catalog.len(), Some(current), self.state.loop_mode) {
            Some(index) if index == current => self.restart(),
            Some(index) => {
                if let Err(e) = self.select_track(index) {
                    warn!("Failed to advance to track {index}: {e}");
                }
            }
            None => {
                self.state.is_playing = false;
                self.autoplay = false;
            }
        }
    }

    fn on_error(&mut self, reason: String) {
        warn!("Backend error: {reason}");
        if self.state.load == LoadPhase::Loading {
            self.state.load = LoadPhase::Failed;
        }
        self.state.is_playing = false;
        self.state.last_error = Some(reason);
        self.autoplay = false;
    }

    // ---- Lyrics ----

    /// Take the lyrics lookup issued by the last track change, if any.
    pub fn take_lyrics_request(&mut self) -> Option<FetchTicket> {
        self.pending_lyrics.take()
    }

    /// Apply a finished lookup. Stale lookups are discarded.
    pub fn apply_lyrics(&mut self, ticket: &FetchTicket, outcome: LyricsOutcome) -> bool {
        self.lyrics.apply(ticket, outcome)
    }

    pub fn retry_lyrics(&mut self) {
        if let Some(ticket) = self.lyrics.retry() {
            self.pending_lyrics = Some(ticket);
        }
    }

    pub const fn lyrics_status(&self) -> &LyricsStatus {
        self.lyrics.status()
    }

    /// Lyric line active at the current playhead.
    pub fn active_lyric_index(&self) -> Option<usize> {
        self.lyrics.active_index(self.state.current_time)
    }
}
