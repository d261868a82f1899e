//! Bounded A/B loop region.
//!
//! At most one region exists. Every gesture goes through
//! [`LoopRegionManager`], which reports what the transport has to do next
//! as a [`RegionChange`].

use duet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A validated `[start, end)` range in seconds. Always `0 <= start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopRegion {
    start: f64,
    end: f64,
}

impl LoopRegion {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "Loop region bounds must be finite: [{start}, {end}]"
            )));
        }
        if start < 0.0 || end <= start {
            return Err(Error::InvalidArgument(format!(
                "Invalid loop region [{start}, {end}]"
            )));
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> f64 {
        self.start
    }

    pub const fn end(&self) -> f64 {
        self.end
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Fold a playhead that ran past `end` back into the region, keeping
    /// the overshoot so the loop stays gapless.
    pub fn wrap(&self, time: f64) -> f64 {
        if time < self.end {
            return time;
        }
        self.start + (time - self.start) % self.span()
    }
}

/// Outcome of a region gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionChange {
    /// Nothing happened.
    Unchanged,
    /// Bounds moved; keep playing where we are.
    Updated(LoopRegion),
    /// Region created or finalized; seek to its start and play.
    Restart(LoopRegion),
    /// Region removed; unrestricted playback range.
    Cleared,
}

/// Owner of the singleton loop region.
#[derive(Debug, Clone)]
pub struct LoopRegionManager {
    region: Option<LoopRegion>,
    enabled: bool,
    default_span: f64,
}

impl LoopRegionManager {
    pub const fn new(default_span: f64) -> Self {
        Self {
            region: None,
            enabled: false,
            default_span,
        }
    }

    pub const fn region(&self) -> Option<LoopRegion> {
        self.region
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Follow the active backend's region capability. Disabling drops the
    /// region.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.region = None;
        }
    }

    /// Set the A boundary at `time`.
    ///
    /// Without a region this creates `[time, time + span]`. With a region it
    /// moves the start and pushes the end out if it would no longer follow
    /// it. Ends are clamped to `duration` when it is known, so an A boundary
    /// at the very end of the track is ignored.
    pub fn set_boundary_a(&mut self, time: f64, duration: f64) -> RegionChange {
        if !self.enabled {
            return RegionChange::Unchanged;
        }

        let default_end = time + self.default_span;
        match self.region {
            None => self.replace(time, default_end, duration, true),
            Some(region) if time < region.end() => {
                self.replace(time, region.end(), duration, false)
            }
            Some(_) => self.replace(time, default_end, duration, false),
        }
    }

    /// Set the B boundary at `time`.
    ///
    /// Without a region this creates `[0, time]`. With a region it moves the
    /// end, provided `time` is past the start.
    pub fn set_boundary_b(&mut self, time: f64, duration: f64) -> RegionChange {
        if !self.enabled {
            return RegionChange::Unchanged;
        }

        let start = self.region.map_or(0.0, |region| region.start());
        if time <= start {
            debug!("Ignoring B boundary at {time:.2}s, not after start {start:.2}s");
            return RegionChange::Unchanged;
        }
        self.replace(start, time, duration, true)
    }

    /// Drag or resize completed with the given bounds. The end is clamped to
    /// `duration` when it is known.
    pub fn update(&mut self, start: f64, end: f64, duration: f64) -> RegionChange {
        if !self.enabled {
            return RegionChange::Unchanged;
        }
        self.replace(start, end, duration, true)
    }

    pub fn clear(&mut self) -> RegionChange {
        match self.region.take() {
            Some(_) => RegionChange::Cleared,
            None => RegionChange::Unchanged,
        }
    }

    /// Store `[start, end]` with `end` clamped to a known duration. A region
    /// left empty by the clamp is rejected like any other degenerate one.
    fn replace(&mut self, start: f64, end: f64, duration: f64, restart: bool) -> RegionChange {
        let end = if duration.is_finite() && duration > 0.0 {
            end.min(duration)
        } else {
            end
        };

        match LoopRegion::new(start, end) {
            Ok(region) => {
                debug!("Loop region set to [{:.2}, {:.2}]", region.start(), region.end());
                self.region = Some(region);
                if restart {
                    RegionChange::Restart(region)
                } else {
                    RegionChange::Updated(region)
                }
            }
            Err(e) => {
                debug!("Rejected loop region: {e}");
                RegionChange::Unchanged
            }
        }
    }
}
