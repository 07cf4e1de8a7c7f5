//! Response snapshots.
//!
//! A [`Snapshot`] is the single response representation shared by the
//! network layer, the cache stores, and callers of the router. It is
//! intentionally not `Clone`: a snapshot handed to one consumer must be
//! branched with [`Snapshot::duplicate`] before a second consumer gets it.

use bytes::Bytes;

/// Status, headers, and body of a response.
#[derive(Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// HTTP status code.
    pub status: u16,
    /// Header pairs in arrival order; names are lowercased.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl Snapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        let headers = headers.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect();
        Self { status, headers, body: body.into() }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value for a header name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Branch an independent copy of this snapshot.
    ///
    /// The body buffer is reference counted, so the copy shares bytes
    /// with the original but neither can observe the other being consumed.
    pub fn duplicate(&self) -> Self {
        Self { status: self.status, headers: self.headers.clone(), body: self.body.clone() }
    }

    /// Headers serialized for storage.
    pub fn headers_json(&self) -> String {
        serde_json::to_string(&self.headers).unwrap_or_else(|_| "[]".to_string())
    }

    /// Rebuild header pairs from their stored form.
    pub fn headers_from_json(json: &str) -> Vec<(String, String)> {
        serde_json::from_str(json).unwrap_or_default()
    }
}
