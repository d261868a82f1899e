//! The ordered, session-scoped playlist.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity


use super::{Track, TrackDescriptor};

/// Ordered playlist. Tracks are immutable once admitted; the transport refers
/// to them by index only.
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all tracks in order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Get the track at `index`.
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Get the number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether `index` is the final track.
    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.tracks.len()
    }

    /// Add a single track to the end and return its index.
    pub fn push(&mut self, descriptor: TrackDescriptor) -> usize {
        let index = self.tracks.len();
        self.tracks.push(Track::from_descriptor(descriptor));
        index
    }

    /// Append a batch, sorted by title, after the existing tracks.
    ///
    /// Returns the index of the first newly added track, or `None` for an empty
    /// batch.
    pub fn extend_sorted(&mut self, mut batch: Vec<TrackDescriptor>) -> Option<usize> {
        if batch.is_empty() {
            return None;
        }

        batch.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        let first = self.tracks.len();
        self.tracks.extend(batch.into_iter().map(Track::from_descriptor));
        Some(first)
    }

    /// Tracks whose title or artist contains `query`, case-insensitively.
    pub fn matching(&self, query: &str) -> Vec<&Track> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.tracks.iter().filter(|t| t.matches(&needle)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackKind;

    fn descriptor(title: &str) -> TrackDescriptor {
        TrackDescriptor::local(title, format!("{title}.mp3"))
    }

    #[test]
    fn test_push_and_get() {
        let mut catalog = TrackCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.push(descriptor("One")), 0);
        assert_eq!(catalog.push(descriptor("Two")), 1);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().title, "Two");
        assert!(catalog.is_last(1));
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_extend_sorted_appends_after_existing() {
        let mut catalog = TrackCatalog::new();
        catalog.push(descriptor("zulu"));

        let first = catalog.extend_sorted(vec![descriptor("Charlie"), descriptor("alpha")]);
        assert_eq!(first, Some(1));

        let titles: Vec<_> = catalog.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["zulu", "alpha", "Charlie"]);
        assert_eq!(catalog.extend_sorted(Vec::new()), None);
    }

    #[test]
    fn test_matching() {
        let mut catalog = TrackCatalog::new();
        catalog.push(TrackDescriptor::new("Blue", "Eiffel 65", "v1", TrackKind::Remote));
        catalog.push(descriptor("Yellow"));

        assert_eq!(catalog.matching("eiffel").len(), 1);
        assert_eq!(catalog.matching("LL").len(), 1);
        assert!(catalog.matching("   ").is_empty());
    }
}
