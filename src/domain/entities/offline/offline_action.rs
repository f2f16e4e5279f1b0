use crate::domain::value_objects::{OfflineActionKind, OfflineActionVerb, OfflinePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// タイムスタンプを持たない、UI から渡される変更要求。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineActionDraft {
    #[serde(rename = "type")]
    pub kind: OfflineActionKind,
    #[serde(rename = "action")]
    pub verb: OfflineActionVerb,
    pub data: OfflinePayload,
}

impl OfflineActionDraft {
    pub fn new(kind: OfflineActionKind, verb: OfflineActionVerb, data: OfflinePayload) -> Self {
        Self { kind, verb, data }
    }

    pub fn stamp(self, timestamp: DateTime<Utc>) -> OfflineAction {
        OfflineAction {
            kind: self.kind,
            verb: self.verb,
            data: self.data,
            timestamp,
        }
    }
}

/// キューに入った変更要求。生成後は変更しない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfflineAction {
    #[serde(rename = "type")]
    pub kind: OfflineActionKind,
    #[serde(rename = "action")]
    pub verb: OfflineActionVerb,
    pub data: OfflinePayload,
    pub timestamp: DateTime<Utc>,
}

impl OfflineAction {
    pub fn label(&self) -> String {
        format!("{}:{}", self.kind, self.verb)
    }
}
