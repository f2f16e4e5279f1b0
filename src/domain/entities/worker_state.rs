use serde::{Deserialize, Serialize};
use std::fmt;

/// サービスワーカー 1 インスタンスのライフサイクル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installing, Redundant)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Activating, Redundant)
                | (Activated, Redundant)
        )
    }

    pub fn can_intercept_fetch(self) -> bool {
        self == WorkerState::Activated
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_order_is_enforced() {
        assert!(WorkerState::Parsed.can_transition_to(WorkerState::Installing));
        assert!(WorkerState::Installed.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Installing.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Parsed.can_transition_to(WorkerState::Activated));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Installing));
    }

    #[test]
    fn only_activated_intercepts_fetch() {
        assert!(WorkerState::Activated.can_intercept_fetch());
        assert!(!WorkerState::Installed.can_intercept_fetch());
    }
}
