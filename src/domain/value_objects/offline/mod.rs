pub mod action_kind;
pub mod action_verb;
pub mod payload;
pub mod replay_policy;

pub use action_kind::OfflineActionKind;
pub use action_verb::OfflineActionVerb;
pub use payload::OfflinePayload;
pub use replay_policy::ReplayPolicy;
