//! Transport tuning knobs.

use std::time::Duration;

use duet_core::{Error, Result, Volume};
use serde::{Deserialize, Serialize};

/// Upper bound on the remote poll cadence; slower polling lets the shared
/// playhead drift more than half a second.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Transport configuration. Every field has a default, so partial config files
/// deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Seconds moved by skip forward/backward.
    pub skip_step_secs: f64,
    /// Length of a loop region created from the A boundary.
    pub default_region_span_secs: f64,
    /// Remote time/volume poll cadence.
    pub poll_interval_ms: u64,
    /// Minimum volume change that counts as an external adjustment.
    pub volume_dead_band: f32,
    /// Volume applied to the first backend.
    pub initial_volume: f32,
    /// Cadence of the local playback clock.
    pub tick_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            skip_step_secs: 10.0,
            default_region_span_secs: 10.0,
            poll_interval_ms: 500,
            volume_dead_band: 0.05,
            initial_volume: Volume::DEFAULT.as_f32(),
            tick_interval_ms: 50,
        }
    }
}

impl TransportConfig {
    /// Remote poll cadence, capped at [`MAX_POLL_INTERVAL`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1)).min(MAX_POLL_INTERVAL)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn initial_volume(&self) -> Volume {
        Volume::new(self.initial_volume)
    }

    /// Reject values that would make the transport misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(self.skip_step_secs.is_finite() && self.skip_step_secs > 0.0) {
            return Err(Error::Config(format!(
                "skip_step_secs must be positive, got {}",
                self.skip_step_secs
            )));
        }
        if !(self.default_region_span_secs.is_finite() && self.default_region_span_secs > 0.0) {
            return Err(Error::Config(format!(
                "default_region_span_secs must be positive, got {}",
                self.default_region_span_secs
            )));
        }
        if !(0.0..1.0).contains(&self.volume_dead_band) {
            return Err(Error::Config(format!(
                "volume_dead_band must be in [0, 1), got {}",
                self.volume_dead_band
            )));
        }
        Ok(())
    }
}
