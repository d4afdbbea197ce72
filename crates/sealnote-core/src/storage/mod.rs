//! Storage backends and the synchronization engine.
//!
//! ## Backends
//!
//! - **local**: one file on disk, mtime as timestamp
//! - **drive**: one file in a Drive-style cloud store over HTTP
//!
//! [`Storage`] reads from all of them, picks the newest document, and
//! repairs stale copies. [`WriteQueue`] sequences writes from an editing
//! session.

pub mod drive;
pub mod engine;
pub mod local;
pub mod traits;
pub mod types;
pub mod writer;

pub use drive::DriveBackend;
pub use engine::Storage;
pub use local::LocalFileBackend;
pub use traits::{StorageFormat, TokenProvider};
pub use types::{ReadOutcome, ReadReport, StoredBlob, WriteReport};
pub use writer::WriteQueue;
