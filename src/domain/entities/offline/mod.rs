pub mod offline_action;
pub mod replay_report;
pub mod status;
pub mod stored_action;

pub use offline_action::{OfflineAction, OfflineActionDraft};
pub use replay_report::{EnqueueOutcome, ReplayReport};
pub use status::OfflineStatus;
pub use stored_action::{NewOfflineRecord, StoredOfflineAction};
