pub mod action_executor;
pub mod background_sync;
pub mod cache_storage;
pub mod network;
pub mod offline_store;

pub use action_executor::ActionExecutor;
pub use background_sync::BackgroundSyncRegistrar;
pub use cache_storage::CacheStorage;
pub use network::NetworkFetcher;
pub use offline_store::OfflineActionStore;
