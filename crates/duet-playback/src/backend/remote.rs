//! Backend for a remotely streamed player.
//!
//! The embedded player owns its own clock and only exposes state on request,
//! so this backend samples it on a fixed cadence and turns differences
//! between samples into normalized events.

use std::time::Duration;

use duet_core::{clamp_time, Error, Result, Track, Volume};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Backend, BackendEvent, Capabilities, EventSink, VolumeControl};
use crate::config::TransportConfig;

/// Duration changes smaller than this are sampling noise.
const DURATION_EPSILON: f64 = 0.5;

/// Player state as reported by the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    #[default]
    Unstarted,
    Cued,
    Buffering,
    Playing,
    Paused,
    Ended,
    /// Player error code.
    Failed(i32),
}

/// One sample of the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub state: RemoteState,
    pub current_time: f64,
    pub duration: f64,
    /// Volume on the player's 0-100 scale.
    pub volume_percent: f32,
}

/// Control surface of an embedded remote player.
pub trait RemotePlayer {
    /// Cue a video by id. Later snapshots describe the new video.
    fn cue(&mut self, video_id: &str) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, seconds: f64);
    fn set_volume(&mut self, percent: f32);
    fn snapshot(&self) -> PlayerSnapshot;
}

/// Polled remote playback. Supports volume only.
pub struct RemoteStreamBackend {
    player: Box<dyn RemotePlayer + Send>,
    sink: Option<EventSink>,
    loaded: bool,
    ready: bool,
    last_state: RemoteState,
    current_time: f64,
    duration: f64,
    volume: Volume,
    dead_band: f32,
    interval: Duration,
}

impl RemoteStreamBackend {
    pub fn new(player: impl RemotePlayer + Send + 'static, config: &TransportConfig) -> Self {
        Self {
            player: Box::new(player),
            sink: None,
            loaded: false,
            ready: false,
            last_state: RemoteState::Unstarted,
            current_time: 0.0,
            duration: 0.0,
            volume: config.initial_volume(),
            dead_band: config.volume_dead_band,
            interval: config.poll_interval(),
        }
    }

    fn emit(&self, event: BackendEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event);
        }
    }

    fn sample_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }
        if !self.ready {
            self.ready = true;
            self.duration = duration;
            info!("Remote stream ready ({duration:.2}s)");
            self.emit(BackendEvent::Ready { duration });
        } else if (duration - self.duration).abs() > DURATION_EPSILON {
            self.duration = duration;
            self.emit(BackendEvent::DurationChanged(duration));
        }
    }

    fn sample_state(&mut self, state: RemoteState) {
        if state == self.last_state {
            return;
        }
        debug!("Remote state {:?} -> {:?}", self.last_state, state);
        self.last_state = state;

        match state {
            RemoteState::Playing => self.emit(BackendEvent::PlayingChanged(true)),
            RemoteState::Paused => self.emit(BackendEvent::PlayingChanged(false)),
            RemoteState::Ended => self.emit(BackendEvent::Ended),
            RemoteState::Failed(code) => {
                warn!("Remote player failed with code {code}");
                self.emit(BackendEvent::Error(format!("Remote player error {code}")));
            }
            RemoteState::Unstarted | RemoteState::Cued | RemoteState::Buffering => {}
        }
    }

    fn sample_volume(&mut self, percent: f32) {
        let polled = Volume::from_percentage(percent);
        if polled.differs_from(self.volume, self.dead_band) {
            debug!(
                "External volume change {:.0}% -> {:.0}%",
                self.volume.as_percentage(),
                polled.as_percentage()
            );
            self.volume = polled;
            self.emit(BackendEvent::VolumeChanged(polled));
        }
    }
}

impl Backend for RemoteStreamBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            playback_rate: false,
            region_loop: false,
            volume: true,
        }
    }

    fn attach(&mut self, sink: EventSink) {
        debug!("Remote backend attached ({})", sink.generation());
        self.sink = Some(sink);
    }

    fn detach(&mut self) {
        if let Some(sink) = self.sink.take() {
            debug!("Remote backend detached ({})", sink.generation());
        }
        if self.loaded {
            self.player.pause();
        }
    }

    fn load(&mut self, track: &Track) -> Result<()> {
        self.loaded = false;
        self.ready = false;
        self.current_time = 0.0;
        self.duration = 0.0;

        self.player
            .cue(&track.source_ref)
            .map_err(|e| Error::load(&track.source_ref, e.to_string()))?;

        self.loaded = true;
        self.player.set_volume(self.volume.as_percentage());
        let snapshot = self.player.snapshot();
        self.last_state = snapshot.state;
        self.sample_duration(snapshot.duration);
        Ok(())
    }

    fn play(&mut self) {
        if !self.loaded {
            self.emit(BackendEvent::Error("No track loaded".to_string()));
            return;
        }
        self.player.play();
    }

    fn pause(&mut self) {
        if self.loaded {
            self.player.pause();
        }
    }

    fn seek(&mut self, seconds: f64) {
        if !self.loaded {
            return;
        }
        self.current_time = clamp_time(seconds, self.duration);
        self.player.seek_to(self.current_time);
        self.emit(BackendEvent::TimeUpdate(self.current_time));
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn poll(&mut self) {
        if self.sink.is_none() || !self.loaded {
            return;
        }

        let snapshot = self.player.snapshot();
        self.sample_duration(snapshot.duration);

        if self.ready && (snapshot.current_time - self.current_time).abs() > f64::EPSILON {
            self.current_time = clamp_time(snapshot.current_time, self.duration);
            self.emit(BackendEvent::TimeUpdate(self.current_time));
        }

        self.sample_state(snapshot.state);
        self.sample_volume(snapshot.volume_percent);
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }

    fn volume_control(&mut self) -> Option<&mut dyn VolumeControl> {
        Some(self)
    }
}

impl VolumeControl for RemoteStreamBackend {
    fn volume(&self) -> Volume {
        self.volume
    }

    fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.player.set_volume(volume.as_percentage());
    }
}
