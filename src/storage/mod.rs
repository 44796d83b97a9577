//! Object storage collaborator.
//!
//! # Data Flow
//! ```text
//! Producer:
//!     ObjectStore::put (confirmed) → StoredObject handle
//!     ObjectStore::set_metadata(handle, traceid/spanid/tracestate)
//!
//! Native-event consumer:
//!     event data.url → ObjectStore::get_metadata(url)
//! ```
//!
//! # Design Decisions
//! - Metadata writes take a `StoredObject`, which only a completed `put` hands
//!   out, so correlation can never be written ahead of the upload
//! - Objects are addressed by URL, the way storage notifications reference them
//! - Backends: in-memory (single process) and local filesystem (shared across
//!   processes on one host)

pub mod filesystem;
pub mod memory;
pub mod recording;
pub mod types;

pub use filesystem::FilesystemObjectStore;
pub use memory::MemoryObjectStore;
pub use recording::{RecordingObjectStore, StoreOperation};
pub use types::{
    ObjectLocator, ObjectMetadata, ObjectStore, StorageError, StorageResult, StoredObject,
};
