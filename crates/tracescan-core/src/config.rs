//! Open modes and scan parameters.

use serde::{Deserialize, Serialize};

/// Default page cutoff when the caller does not supply one.
pub const DEFAULT_MAX_COUNT: usize = 1000;

/// How an [`Instance`](crate::Instance) views the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenMode {
    /// Exclusive or cooperative read on the data directory; no writer is
    /// expected.
    ReadOnly,
    /// Follower view of a store whose primary is written elsewhere. The
    /// view may lag the primary; each scan is still internally consistent.
    Secondary,
}

/// Parameters of one paginated range scan.
///
/// Keys are opaque byte strings; an empty key means "unbounded on that
/// side". The effective range is `(start_key, end_key)`: the start key
/// itself is excluded so a previous page's `last_key` can be passed back
/// verbatim to resume without re-reading it.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Serialized predicate in the tagged-JSON wire format.
    pub query: Vec<u8>,
    /// Lower key bound; excluded from results when it names a record.
    pub start_key: Vec<u8>,
    /// Exclusive upper key bound.
    pub end_key: Vec<u8>,
    /// Page cutoff. Zero falls back to [`DEFAULT_MAX_COUNT`].
    pub max_count: usize,
}

impl ScanRequest {
    /// A full-range request for `query` with the default page cutoff.
    pub fn new(query: impl Into<Vec<u8>>) -> Self {
        ScanRequest {
            query: query.into(),
            ..ScanRequest::default()
        }
    }
}

impl Default for ScanRequest {
    fn default() -> Self {
        ScanRequest {
            query: Vec::new(),
            start_key: Vec::new(),
            end_key: Vec::new(),
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}
