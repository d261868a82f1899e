//! Common types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Volume level (0.0 to 1.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    pub const MIN: Self = Self(0.0);
    pub const MAX: Self = Self(1.0);
    pub const DEFAULT: Self = Self(0.8);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub const fn as_f32(&self) -> f32 {
        self.0
    }

    /// Volume in the 0-100 scale used by embedded remote players.
    pub fn as_percentage(&self) -> f32 {
        self.0 * 100.0
    }

    pub fn from_percentage(percent: f32) -> Self {
        Self::new(percent / 100.0)
    }

    /// Whether `other` differs from this volume by more than `dead_band`.
    pub fn differs_from(&self, other: Self, dead_band: f32) -> bool {
        (self.0 - other.0).abs() > dead_band
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Clamp a playhead time into `[0, duration]`.
///
/// An unknown duration (zero or non-finite) only bounds the lower end.
pub fn clamp_time(seconds: f64, duration: f64) -> f64 {
    let seconds = if seconds.is_finite() { seconds } else { 0.0 };
    let lower = seconds.max(0.0);
    if duration.is_finite() && duration > 0.0 {
        lower.min(duration)
    } else {
        lower
    }
}

/// Format seconds as M:SS or H:MM:SS.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total_secs = seconds.floor() as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
