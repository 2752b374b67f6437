//! Key-value store implementations - JSON file on disk and in-memory.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;
