pub mod cache;
pub mod offline;

pub use cache::{CacheName, CacheSet, RequestClass};
pub use offline::{OfflineActionKind, OfflineActionVerb, OfflinePayload, ReplayPolicy};
