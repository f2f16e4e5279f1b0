use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineStatus {
    pub is_online: bool,
    pub pending_actions_count: usize,
    pub has_pending_actions: bool,
}

impl OfflineStatus {
    pub fn new(is_online: bool, pending_actions_count: usize) -> Self {
        Self {
            is_online,
            pending_actions_count,
            has_pending_actions: pending_actions_count > 0,
        }
    }
}
