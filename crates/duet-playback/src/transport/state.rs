//! The shared playback state.

use duet_core::{LoopMode, Volume};
use serde::{Deserialize, Serialize};

/// Where the selected track is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPhase {
    /// Nothing selected.
    #[default]
    Idle,
    /// Waiting for the backend to report ready.
    Loading,
    Ready,
    /// The backend could not open the source.
    Failed,
}

/// Snapshot of the one authoritative playhead. Only the transport controller
/// writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Catalog index of the selected track.
    pub position: Option<usize>,
    pub is_playing: bool,
    /// Playhead in seconds.
    pub current_time: f64,
    /// Duration in seconds, 0 while unknown.
    pub duration: f64,
    /// Effective rate of the active backend.
    pub playback_rate: f64,
    pub loop_mode: LoopMode,
    pub volume: Volume,
    pub load: LoadPhase,
    /// Last load or playback failure, cleared on track change.
    pub last_error: Option<String>,
}

impl PlaybackState {
    pub fn new(volume: Volume) -> Self {
        Self {
            position: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            playback_rate: 1.0,
            loop_mode: LoopMode::Off,
            volume,
            load: LoadPhase::Idle,
            last_error: None,
        }
    }

    /// Playhead progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Reset the per-track fields for a newly selected track.
    pub(crate) fn begin_load(&mut self, index: usize, duration_hint: Option<f64>) {
        self.position = Some(index);
        self.is_playing = false;
        self.current_time = 0.0;
        self.duration = duration_hint.unwrap_or(0.0);
        self.load = LoadPhase::Loading;
        self.last_error = None;
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(Volume::DEFAULT)
    }
}
