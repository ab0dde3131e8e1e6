//! In-flight claim sets.
//!
//! A key is claimed by exactly one worker while it is being resolved. A
//! remote URL is additionally claimed by the worker that fetches it; other
//! keys resolving to the same URL park their claims on the URL entry and are
//! published by the fetching worker.
//!
//! Claims are guards: dropping one releases it, so every exit path of a
//! worker (including cancellation) gives the key back.

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;

use crate::tile::TileKey;

/// Keys currently claimed by a worker.
#[derive(Clone, Default)]
pub(crate) struct KeyClaims {
    claimed: Arc<DashSet<TileKey>>,
}

impl KeyClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` if nobody holds it.
    pub fn try_claim(&self, key: &TileKey) -> Option<KeyClaim> {
        if self.claimed.insert(key.clone()) {
            Some(KeyClaim {
                claims: self.clone(),
                key: key.clone(),
            })
        } else {
            None
        }
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.claimed.contains(key)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }
}

/// Exclusive claim on one key, released on drop.
pub(crate) struct KeyClaim {
    claims: KeyClaims,
    key: TileKey,
}

impl KeyClaim {
    pub fn key(&self) -> &TileKey {
        &self.key
    }
}

impl Drop for KeyClaim {
    fn drop(&mut self) {
        self.claims.claimed.remove(&self.key);
    }
}

/// URLs currently being fetched, with the extra keys waiting on each.
#[derive(Clone, Default)]
pub(crate) struct UrlClaims {
    fetching: Arc<DashMap<String, Vec<KeyClaim>>>,
}

impl UrlClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for the worker holding `claim`.
    ///
    /// Returns `None` when another worker is already fetching the URL; the
    /// key claim is then parked on that fetch and published with its result.
    pub fn claim(&self, url: &str, claim: KeyClaim) -> Option<UrlClaim> {
        match self.fetching.entry(url.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push(claim);
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(Vec::new());
                Some(UrlClaim {
                    claims: self.clone(),
                    url: url.to_string(),
                    owner: Some(claim),
                })
            }
        }
    }

    #[cfg(test)]
    pub fn contains(&self, url: &str) -> bool {
        self.fetching.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.fetching.len()
    }
}

/// Exclusive claim on one URL, released on drop together with every key
/// parked on it.
pub(crate) struct UrlClaim {
    claims: UrlClaims,
    url: String,
    owner: Option<KeyClaim>,
}

impl UrlClaim {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Key of the worker performing the fetch.
    #[cfg(test)]
    pub fn key(&self) -> Option<&TileKey> {
        self.owner.as_ref().map(KeyClaim::key)
    }

    /// Close the URL to new waiters and hand back every key claim that
    /// should receive the fetched tile, the fetching key first.
    pub fn finish(mut self) -> Vec<KeyClaim> {
        let parked = self
            .claims
            .fetching
            .remove(&self.url)
            .map(|(_, parked)| parked)
            .unwrap_or_default();

        let mut claims = Vec::with_capacity(parked.len() + 1);
        claims.extend(self.owner.take());
        claims.extend(parked);
        claims
    }
}

impl Drop for UrlClaim {
    fn drop(&mut self) {
        // A finished claim no longer owns the entry; another worker may
        // have claimed the URL since.
        if self.owner.is_some() {
            self.claims.fetching.remove(&self.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LocalProvider, ProviderRef};

    fn key(x: i32) -> TileKey {
        TileKey::new(x, 0, 3, ProviderRef::new(LocalProvider::new("test", 256)))
    }

    #[test]
    fn test_key_claim_is_exclusive() {
        let claims = KeyClaims::new();
        let first = claims.try_claim(&key(1));
        assert!(first.is_some());
        assert!(claims.try_claim(&key(1)).is_none());
        assert!(claims.try_claim(&key(2)).is_some());
    }

    #[test]
    fn test_key_claim_released_on_drop() {
        let claims = KeyClaims::new();
        let claim = claims.try_claim(&key(1)).unwrap();
        assert!(claims.contains(&key(1)));

        drop(claim);
        assert!(!claims.contains(&key(1)));
        assert!(claims.try_claim(&key(1)).is_some());
    }

    #[test]
    fn test_url_claim_parks_aliased_keys() {
        let keys = KeyClaims::new();
        let urls = UrlClaims::new();

        let owner = urls
            .claim("http://tiles/1", keys.try_claim(&key(1)).unwrap())
            .unwrap();
        assert!(urls
            .claim("http://tiles/1", keys.try_claim(&key(2)).unwrap())
            .is_none());

        // The parked key stays claimed until the fetch finishes.
        assert!(keys.contains(&key(2)));

        let claims = owner.finish();
        let finished: Vec<_> = claims.iter().map(|c| c.key().clone()).collect();
        assert_eq!(finished, vec![key(1), key(2)]);
        assert!(!urls.contains("http://tiles/1"));

        // A new fetch of the same URL is unaffected by the finished one.
        let next = urls
            .claim("http://tiles/1", keys.try_claim(&key(3)).unwrap())
            .unwrap();
        assert!(urls.contains("http://tiles/1"));
        drop(next);

        drop(claims);
        assert_eq!(keys.len(), 0);
    }

    #[test]
    fn test_dropped_url_claim_releases_everything() {
        let keys = KeyClaims::new();
        let urls = UrlClaims::new();

        let owner = urls
            .claim("http://tiles/1", keys.try_claim(&key(1)).unwrap())
            .unwrap();
        urls.claim("http://tiles/1", keys.try_claim(&key(2)).unwrap());
        assert_eq!(owner.url(), "http://tiles/1");
        assert_eq!(owner.key(), Some(&key(1)));

        drop(owner);
        assert_eq!(urls.len(), 0);
        assert_eq!(keys.len(), 0);
    }
}
