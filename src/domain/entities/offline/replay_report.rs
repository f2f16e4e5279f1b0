use crate::domain::value_objects::ReplayPolicy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum EnqueueOutcome {
    /// オンラインだったので即時実行した（永続化しない）
    Executed { success: bool },
    /// オフラインだったので保留リストに積んだ
    Queued { persisted: bool, pending: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub retained: usize,
    pub store_cleared: bool,
    pub duration_ms: u64,
    #[serde(skip)]
    pub policy: Option<ReplayPolicy>,
}

impl ReplayReport {
    pub fn is_noop(&self) -> bool {
        self.attempted == 0
    }
}
