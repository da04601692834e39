//! Known-UID state.
//!
//! The poller reads this once at the start of a cycle and writes it back
//! at the end. Storage is pluggable through [`KnownUidStore`].

mod memory;
mod model;
mod repository;

pub use memory::MemoryStateStore;
pub use model::{KnownUidStore, KnownUids};
pub use repository::SqliteStateRepository;
