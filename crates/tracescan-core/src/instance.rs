//! Read-only store instances and the paginated range scan.

use rocksdb::{IteratorMode, Options, ReadOptions, DB};
use serde_json::Value;

use crate::compile::compile;
use crate::config::{OpenMode, ScanRequest, DEFAULT_MAX_COUNT};
use crate::error::Error;
use crate::response::Response;

/// One opened read view of an ordered byte-string keyed store.
///
/// An `Instance` owns no mutable store state. It may service any number of
/// concurrent scans; each scan takes its own snapshot and iterator, so no
/// scan observes another's progress.
pub struct Instance {
    db: DB,
    mode: OpenMode,
}

impl Instance {
    /// Open the store at `data_dir` in read-only mode.
    pub fn open(data_dir: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let db = DB::open_for_read_only(&Options::default(), data_dir, false)
            .map_err(Error::Open)?;
        Ok(Instance {
            db,
            mode: OpenMode::ReadOnly,
        })
    }

    /// Open the store at `data_dir` as a secondary (follower) of a primary
    /// written elsewhere. `secondary_dir` is a writable scratch directory
    /// private to this follower.
    pub fn open_secondary(
        data_dir: impl AsRef<std::path::Path>,
        secondary_dir: impl AsRef<std::path::Path>,
    ) -> Result<Self, Error> {
        let db = DB::open_as_secondary(&Options::default(), data_dir, secondary_dir)
            .map_err(Error::Open)?;
        Ok(Instance {
            db,
            mode: OpenMode::Secondary,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Pull a secondary's view forward to the primary's current state.
    ///
    /// Freshness is still not guaranteed after this returns; the primary
    /// keeps writing. Errors on read-only instances.
    pub fn catch_up_with_primary(&self) -> Result<(), Error> {
        if self.mode != OpenMode::Secondary {
            return Err(Error::NotSecondary);
        }
        self.db.try_catch_up_with_primary().map_err(Error::CatchUp)
    }

    /// Run one paginated filtered range scan.
    ///
    /// Compiles the request's predicate, takes a snapshot, and walks the
    /// key range `(start_key, end_key)` in key order, appending each
    /// matching record's raw value until the page cutoff. When the page is
    /// cut, the response carries `more = true` and the key to resume from.
    ///
    /// Records whose value is not parseable JSON are skipped, not errors.
    /// Store-level iteration failures abort the scan.
    pub fn scan(&self, request: &ScanRequest) -> Result<Response, Error> {
        let predicate = compile(&request.query)?;
        let max_count = if request.max_count == 0 {
            DEFAULT_MAX_COUNT
        } else {
            request.max_count
        };

        let mut read_opts = ReadOptions::default();
        if !request.start_key.is_empty() {
            read_opts.set_iterate_lower_bound(request.start_key.clone());
        }
        if !request.end_key.is_empty() {
            read_opts.set_iterate_upper_bound(request.end_key.clone());
        }

        // Snapshot and iterator are scoped to this call; every exit path,
        // including errors and the cutoff break, releases both.
        let snapshot = self.db.snapshot();
        let iter = snapshot.iterator_opt(IteratorMode::Start, read_opts);

        let mut response = Response::default();
        let mut at_first = true;
        for entry in iter {
            let (key, value) = entry.map_err(Error::Iteration)?;

            // The start key itself is excluded, so a caller resuming with
            // `start_key = previous.last_key` never re-reads a record.
            if at_first {
                at_first = false;
                if !request.start_key.is_empty() && key.as_ref() == request.start_key.as_slice() {
                    continue;
                }
            }

            let doc: Value = match serde_json::from_slice(&value) {
                Ok(doc) => doc,
                Err(error) => {
                    tracing::debug!(
                        key = %String::from_utf8_lossy(&key),
                        %error,
                        "skipping record with unparsable value"
                    );
                    continue;
                }
            };

            if predicate.eval(&doc) {
                response.push(value.into_vec());
                if response.len() >= max_count {
                    response.cut(key.into_vec());
                    break;
                }
            }
        }
        Ok(response)
    }
}
