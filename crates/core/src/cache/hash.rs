//! Request keys for cache entries.

use sha2::{Digest, Sha256};

/// Compute the storage hash for a request key.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical request key: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: String,
    url: String,
}

impl CacheKey {
    pub fn new(method: &str, url: &str) -> Self {
        let url = url.split_once('#').map_or(url, |(head, _)| head);
        Self { method: method.to_ascii_uppercase(), url: url.to_string() }
    }

    /// Key for a GET of `url`.
    pub fn get(url: &str) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}
