pub mod memory_store;
mod rows;
pub mod sqlite_store;

pub use memory_store::MemoryOfflineActionStore;
pub use sqlite_store::SqliteOfflineActionStore;
