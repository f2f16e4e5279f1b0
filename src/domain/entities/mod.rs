pub mod http;
pub mod offline;
pub mod worker_state;

pub use http::{CachedResponse, Request, RequestDestination, RequestMethod, RequestMode, Response};
pub use offline::{
    EnqueueOutcome, NewOfflineRecord, OfflineAction, OfflineActionDraft, OfflineStatus,
    ReplayReport, StoredOfflineAction,
};
pub use worker_state::WorkerState;
