//! Playback backends behind a common transport contract.
//!
//! A backend is subscribed with an [`EventSink`] stamped with the controller's
//! current generation. Everything it reports goes through that sink, so events
//! from a backend that has since been swapped out carry an old generation and
//! are dropped by the controller.

mod local;
mod remote;

pub use local::{LocalAudioBackend, LocalMedia};
pub use remote::{PlayerSnapshot, RemotePlayer, RemoteState, RemoteStreamBackend};

use std::time::Duration;

use crossbeam_channel::Sender;
use duet_core::{Generation, Result, Track, Volume};
use tracing::trace;

use crate::region::LoopRegion;

/// Normalized events emitted by every backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Source opened; duration known (in seconds).
    Ready { duration: f64 },
    /// Playhead moved (in seconds).
    TimeUpdate(f64),
    /// Duration refined after readiness (in seconds).
    DurationChanged(f64),
    /// Natural end of the track.
    Ended,
    /// Playback failed.
    Error(String),
    /// Volume changed outside our control.
    VolumeChanged(Volume),
    /// Play/pause changed outside our control.
    PlayingChanged(bool),
}

/// A backend event tagged with the generation of the subscription that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: Generation,
    pub event: BackendEvent,
}

/// Subscription handle given to a backend on attach.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<Envelope>,
    generation: Generation,
}

impl EventSink {
    pub const fn new(tx: Sender<Envelope>, generation: Generation) -> Self {
        Self { tx, generation }
    }

    pub const fn generation(&self) -> Generation {
        self.generation
    }

    pub fn emit(&self, event: BackendEvent) {
        let envelope = Envelope {
            generation: self.generation,
            event,
        };
        if self.tx.send(envelope).is_err() {
            trace!("Event receiver dropped, discarding backend event");
        }
    }
}

/// Optional capabilities a backend offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub playback_rate: bool,
    pub region_loop: bool,
    pub volume: bool,
}

/// Variable-speed playback.
pub trait RateControl {
    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&mut self, rate: f64);
}

/// Gapless looping of a bounded region.
pub trait RegionLoop {
    fn region(&self) -> Option<LoopRegion>;
    /// Replace the active region; `None` restores the full playback range.
    fn set_region(&mut self, region: Option<LoopRegion>);
}

/// Volume read/write.
pub trait VolumeControl {
    fn volume(&self) -> Volume;
    fn set_volume(&mut self, volume: Volume);
}

/// A playback engine driven by the transport controller.
pub trait Backend {
    fn capabilities(&self) -> Capabilities;

    /// Subscribe. Replaces any previous subscription.
    fn attach(&mut self, sink: EventSink);

    /// Unsubscribe. After this returns the backend emits nothing.
    fn detach(&mut self);

    /// Open a track. Failures detected synchronously are returned; readiness
    /// (and later failures) arrive as events.
    fn load(&mut self, track: &Track) -> Result<()>;

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    /// Advance a push-driven playback clock.
    fn advance(&mut self, _elapsed: Duration) {}

    /// Sample externally owned player state.
    fn poll(&mut self) {}

    /// How often [`Backend::poll`] should run, for backends that need it.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }

    fn rate_control(&mut self) -> Option<&mut dyn RateControl> {
        None
    }

    fn region_loop(&mut self) -> Option<&mut dyn RegionLoop> {
        None
    }

    fn volume_control(&mut self) -> Option<&mut dyn VolumeControl> {
        None
    }
}
