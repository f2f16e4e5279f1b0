use crate::domain::entities::offline::OfflineAction;
use crate::domain::value_objects::{OfflineActionKind, OfflineActionVerb, OfflinePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ストアへ書き込むレコード。`timestamp` が無ければストア側で付与する。
#[derive(Debug, Clone, PartialEq)]
pub struct NewOfflineRecord {
    pub kind: OfflineActionKind,
    pub verb: OfflineActionVerb,
    pub data: OfflinePayload,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewOfflineRecord {
    pub fn into_action(self, now: DateTime<Utc>) -> OfflineAction {
        OfflineAction {
            kind: self.kind,
            verb: self.verb,
            data: self.data,
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

impl From<&OfflineAction> for NewOfflineRecord {
    fn from(action: &OfflineAction) -> Self {
        Self {
            kind: action.kind,
            verb: action.verb,
            data: action.data.clone(),
            timestamp: Some(action.timestamp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredOfflineAction {
    pub id: i64,
    #[serde(flatten)]
    pub action: OfflineAction,
}
