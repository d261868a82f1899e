//! # duet-search
//!
//! Track discovery for Duet.
//!
//! A query is matched against the local catalog first, then sent to a remote
//! provider. Providers are keyed; a key that has run out of quota is skipped
//! and the next one is tried.

use duet_core::{Error, Result, Track, TrackCatalog, TrackDescriptor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A remote source of track descriptors.
#[allow(async_fn_in_trait)]
pub trait SearchProvider {
    /// Search with one API key. A rejected key is reported as
    /// [`Error::QuotaExceeded`].
    async fn search(&self, query: &str, api_key: &str) -> Result<Vec<TrackDescriptor>>;
}

/// Result of a combined search. Failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum SearchOutcome {
    /// Local matches followed by remote results.
    Found(Vec<TrackDescriptor>),
    /// Every source failed and nothing matched locally.
    Failed(String),
}

impl SearchOutcome {
    pub fn results(&self) -> &[TrackDescriptor] {
        match self {
            Self::Found(results) => results,
            Self::Failed(_) => &[],
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Searches the catalog and a keyed remote provider.
pub struct SearchService<P> {
    provider: P,
    api_keys: Vec<String>,
}

impl<P: SearchProvider> SearchService<P> {
    /// Create a service. Blank keys are dropped.
    pub fn new(provider: P, api_keys: impl IntoIterator<Item = String>) -> Self {
        let api_keys = api_keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        Self { provider, api_keys }
    }

    /// Build the key list from a comma-separated string.
    pub fn from_key_list(provider: P, keys: &str) -> Self {
        Self::new(provider, keys.split(',').map(str::to_string))
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn search(&self, query: &str, catalog: &TrackCatalog) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::Found(Vec::new());
        }

        let mut results: Vec<TrackDescriptor> = catalog
            .matching(query)
            .into_iter()
            .map(descriptor_of)
            .collect();
        debug!("{} local matches for {query:?}", results.len());

        match self.search_remote(query).await {
            Ok(remote) => {
                info!("Found {} remote results for {query:?}", remote.len());
                results.extend(remote);
                SearchOutcome::Found(results)
            }
            Err(e) if results.is_empty() => {
                warn!("Search failed for {query:?}: {e}");
                SearchOutcome::Failed(e.to_string())
            }
            Err(e) => {
                warn!("Remote search failed, returning local matches only: {e}");
                SearchOutcome::Found(results)
            }
        }
    }

    /// Try each key in turn until one succeeds.
    async fn search_remote(&self, query: &str) -> Result<Vec<TrackDescriptor>> {
        if self.api_keys.is_empty() {
            return Err(Error::Search("missing API keys".to_string()));
        }

        let mut last_error = None;
        for key in &self.api_keys {
            let hint = key_hint(key);
            debug!("Trying API key ...{hint}");

            match self.provider.search(query, key).await {
                Ok(results) => return Ok(results),
                Err(e) if e.is_quota_exceeded() => {
                    warn!("Key ...{hint} quota exceeded, rotating");
                    last_error = Some(e);
                }
                Err(e) => {
                    warn!("Search with key ...{hint} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Search("all API keys failed".to_string())))
    }
}

/// Last four characters of a key, for logs.
pub fn key_hint(key: &str) -> &str {
    let start = key
        .char_indices()
        .rev()
        .nth(3)
        .map_or(0, |(index, _)| index);
    &key[start..]
}

fn descriptor_of(track: &Track) -> TrackDescriptor {
    TrackDescriptor {
        title: track.title.clone(),
        artist: track.artist.clone(),
        source_ref: track.source_ref.clone(),
        kind: track.kind,
        artwork_ref: track.artwork_ref.clone(),
        duration_hint: track.duration_hint,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use duet_core::TrackKind;
    use std::sync::Mutex;

    /// Provider that rejects the listed keys and records every key it sees.
    #[derive(Default)]
    struct KeyedProvider {
        exhausted: Vec<&'static str>,
        broken: Vec<&'static str>,
        seen: Mutex<Vec<String>>,
    }

    impl SearchProvider for KeyedProvider {
        async fn search(&self, query: &str, api_key: &str) -> Result<Vec<TrackDescriptor>> {
            self.seen.lock().unwrap().push(api_key.to_string());
            if self.exhausted.iter().any(|k| *k == api_key) {
                return Err(Error::QuotaExceeded {
                    key_hint: key_hint(api_key).to_string(),
                });
            }
            if self.broken.iter().any(|k| *k == api_key) {
                return Err(Error::Network("connection reset".into()));
            }
            Ok(vec![TrackDescriptor::remote(
                format!("{query} (remote)"),
                "Channel",
                format!("vid-{api_key}"),
            )])
        }
    }

    fn catalog() -> TrackCatalog {
        let mut catalog = TrackCatalog::new();
        catalog.push(TrackDescriptor::local("Night Drive", "night.mp3").with_artist("Synth"));
        catalog.push(TrackDescriptor::local("Morning", "morning.mp3"));
        catalog
    }

    #[test]
    fn test_blank_keys_are_dropped() {
        let service = SearchService::from_key_list(KeyedProvider::default(), " a1, ,b2,");
        assert_eq!(service.key_count(), 2);
    }

    #[test]
    fn test_key_hint() {
        assert_eq!(key_hint("AIzaSyABCD1234"), "1234");
        assert_eq!(key_hint("ab"), "ab");
    }

    #[tokio::test]
    async fn test_local_matches_come_first() {
        let service = SearchService::from_key_list(KeyedProvider::default(), "key1");
        let outcome = service.search("night", &catalog()).await;

        let results = outcome.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Night Drive");
        assert_eq!(results[0].kind, TrackKind::Local);
        assert_eq!(results[1].kind, TrackKind::Remote);
    }

    #[tokio::test]
    async fn test_rotates_past_exhausted_keys() {
        let provider = KeyedProvider {
            exhausted: vec!["key1"],
            broken: vec!["key2"],
            ..Default::default()
        };
        let service = SearchService::from_key_list(provider, "key1,key2,key3");
        let outcome = service.search("anything", &TrackCatalog::new()).await;

        assert_eq!(outcome.results()[0].source_ref, "vid-key3");
        assert_eq!(
            *service.provider().seen.lock().unwrap(),
            vec!["key1", "key2", "key3"]
        );
    }

    #[tokio::test]
    async fn test_all_keys_fail_without_local_matches() {
        let provider = KeyedProvider {
            exhausted: vec!["key1", "key2"],
            ..Default::default()
        };
        let service = SearchService::from_key_list(provider, "key1,key2");
        let outcome = service.search("nothing here", &catalog()).await;
        assert!(outcome.is_failed());
    }

    #[tokio::test]
    async fn test_all_keys_fail_with_local_matches() {
        let provider = KeyedProvider {
            exhausted: vec!["key1"],
            ..Default::default()
        };
        let service = SearchService::from_key_list(provider, "key1");
        let outcome = service.search("synth", &catalog()).await;
        assert_eq!(outcome.results().len(), 1);
        assert!(!outcome.is_failed());
    }

    #[tokio::test]
    async fn test_missing_keys_and_blank_query() {
        let service = SearchService::new(KeyedProvider::default(), Vec::new());
        assert_eq!(
            service.search("zzz", &catalog()).await,
            SearchOutcome::Failed("Search provider error: missing API keys".to_string())
        );
        assert_eq!(
            service.search("   ", &catalog()).await,
            SearchOutcome::Found(Vec::new())
        );
        assert!(service.provider().seen.lock().unwrap().is_empty());
    }
}
