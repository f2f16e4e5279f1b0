pub mod cache_router;
pub mod connectivity;
pub mod offline_queue;
pub mod request_classifier;

pub use cache_router::{
    CacheRouter, FetchDisposition, ResponseSource, RouterSettings, WorkerEvent, WorkerOutcome,
};
pub use connectivity::{ConnectivityEvent, ConnectivityObserver, ConnectivitySignal};
pub use offline_queue::OfflineActionQueue;
pub use request_classifier::RequestClassifier;
