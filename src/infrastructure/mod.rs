pub mod cache;
pub mod executor;
pub mod network;
pub mod offline;
pub mod sync;
