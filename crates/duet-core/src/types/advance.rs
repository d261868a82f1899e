//! Loop modes and playlist advancement decisions.
//!
//! Everything here is a pure function of the catalog length, the current index
//! and the loop mode. Natural end-of-track handling (including `LoopMode::One`)
//! lives in the transport controller, not here.

use serde::{Deserialize, Serialize};

/// Loop mode for playback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Play through once and stop on the last track.
    #[default]
    Off,
    /// Wrap around to the first track.
    All,
    /// Repeat the current track on natural end.
    One,
}

impl LoopMode {
    /// The mode after `self` in the `off -> all -> one -> off` cycle.
    pub const fn cycled(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

/// Navigation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Resolve the index reached by moving in `direction`.
///
/// Returns `None` when there is nowhere to go.
pub fn resolve(
    catalog_len: usize,
    current: Option<usize>,
    mode: LoopMode,
    direction: Direction,
) -> Option<usize> {
    match direction {
        Direction::Next => next_index(catalog_len, current, mode),
        Direction::Previous => previous_index(catalog_len, current, mode),
    }
}

/// Index after `current`. `None` at the end of a non-wrapping playlist.
pub fn next_index(catalog_len: usize, current: Option<usize>, mode: LoopMode) -> Option<usize> {
    if catalog_len == 0 {
        return None;
    }

    let Some(current) = current else {
        return Some(0);
    };

    let next = current.saturating_add(1);
    if next < catalog_len {
        return Some(next);
    }

    match mode {
        LoopMode::All => Some(0),
        LoopMode::Off | LoopMode::One => None,
    }
}

/// Index before `current`. At the first index this stays put, unless the
/// playlist wraps.
pub fn previous_index(
    catalog_len: usize,
    current: Option<usize>,
    mode: LoopMode,
) -> Option<usize> {
    if catalog_len == 0 {
        return None;
    }

    let current = current.unwrap_or(0).min(catalog_len - 1);
    if current > 0 {
        return Some(current - 1);
    }

    match mode {
        LoopMode::All => Some(catalog_len - 1),
        LoopMode::Off | LoopMode::One => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cycle_order() {
        assert_eq!(LoopMode::Off.cycled(), LoopMode::All);
        assert_eq!(LoopMode::All.cycled(), LoopMode::One);
        assert_eq!(LoopMode::One.cycled(), LoopMode::Off);
    }

    #[test]
    fn test_next_in_middle() {
        assert_eq!(next_index(3, Some(0), LoopMode::Off), Some(1));
        assert_eq!(next_index(3, Some(1), LoopMode::One), Some(2));
    }

    #[test]
    fn test_next_at_end() {
        assert_eq!(next_index(3, Some(2), LoopMode::Off), None);
        assert_eq!(next_index(3, Some(2), LoopMode::One), None);
        assert_eq!(next_index(3, Some(2), LoopMode::All), Some(0));
    }

    #[test]
    fn test_previous_at_start() {
        assert_eq!(previous_index(3, Some(0), LoopMode::Off), Some(0));
        assert_eq!(previous_index(3, Some(0), LoopMode::All), Some(2));
        assert_eq!(previous_index(3, Some(2), LoopMode::Off), Some(1));
    }

    #[test]
    fn test_empty_and_unselected() {
        assert_eq!(next_index(0, None, LoopMode::All), None);
        assert_eq!(previous_index(0, None, LoopMode::All), None);
        assert_eq!(next_index(4, None, LoopMode::Off), Some(0));
        assert_eq!(
            resolve(4, None, LoopMode::Off, Direction::Previous),
            Some(0)
        );
    }

    fn any_mode() -> impl Strategy<Value = LoopMode> {
        prop_oneof![Just(LoopMode::Off), Just(LoopMode::All), Just(LoopMode::One)]
    }

    proptest! {
        #[test]
        fn prop_all_never_ends(len in 1usize..64, offset in 0usize..64) {
            let current = offset % len;
            prop_assert!(next_index(len, Some(current), LoopMode::All).is_some());
        }

        #[test]
        fn prop_off_stops_at_last(len in 1usize..64) {
            prop_assert_eq!(next_index(len, Some(len - 1), LoopMode::Off), None);
            prop_assert_eq!(previous_index(len, Some(0), LoopMode::Off), Some(0));
        }

        #[test]
        fn prop_result_in_bounds(
            len in 1usize..64,
            offset in 0usize..64,
            mode in any_mode(),
            forward in any::<bool>(),
        ) {
            let direction = if forward { Direction::Next } else { Direction::Previous };
            if let Some(index) = resolve(len, Some(offset % len), mode, direction) {
                prop_assert!(index < len);
            }
        }
    }
}
