//! Read-only range-scan queries over RocksDB trace logs.
//!
//! A store holds opaque byte-string keys mapped to JSON documents (trace
//! records written by a separate ingestion process). This crate opens that
//! store read-only (or as a secondary follower of a live writer), compiles
//! a serialized predicate into a typed expression tree, and walks a key
//! range under a snapshot, returning matching raw values as a bounded page
//! with a resume token.
//!
//! # Example
//!
//! ```no_run
//! use tracescan_core::{Instance, ScanRequest};
//!
//! # fn main() -> Result<(), tracescan_core::Error> {
//! let instance = Instance::open("/data/tracelogs")?;
//! let mut request = ScanRequest::new(
//!     br#"{"type": 1, "lower": 5, "upper": 9, "column": "val"}"#.to_vec(),
//! );
//! request.max_count = 100;
//!
//! loop {
//!     let page = instance.scan(&request)?;
//!     for value in page.values() {
//!         println!("{}", String::from_utf8_lossy(value));
//!     }
//!     if !page.more() {
//!         break;
//!     }
//!     request.start_key = page.last_key().to_vec();
//! }
//! # Ok(())
//! # }
//! ```

pub mod compile;
pub mod config;
pub mod error;
pub mod instance;
pub mod path;
pub mod predicate;
pub mod response;

pub use compile::{check, compile};
pub use config::{OpenMode, ScanRequest, DEFAULT_MAX_COUNT};
pub use error::{Error, ErrorCode};
pub use instance::Instance;
pub use predicate::{CmpOp, Predicate, Scalar};
pub use response::Response;
