//! Durable library state: registry and embedding cache

pub mod registry;
pub mod sidecar;
pub mod sqlite;

pub use registry::Registry;
pub use sidecar::EmbeddingSidecar;
pub use sqlite::SqliteRegistry;
