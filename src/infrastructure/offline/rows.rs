use crate::domain::entities::{OfflineAction, StoredOfflineAction};
use crate::domain::value_objects::{OfflineActionKind, OfflineActionVerb, OfflinePayload};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub(super) struct OfflineActionRow {
    pub id: i64,
    pub kind: String,
    pub verb: String,
    pub data: String,
    pub timestamp: String,
}

impl OfflineActionRow {
    pub(super) fn into_stored(self) -> Result<StoredOfflineAction, AppError> {
        let kind = self
            .kind
            .parse::<OfflineActionKind>()
            .map_err(AppError::SerializationError)?;
        let verb = self
            .verb
            .parse::<OfflineActionVerb>()
            .map_err(AppError::SerializationError)?;
        let data = OfflinePayload::from_json_str(&self.data).map_err(AppError::SerializationError)?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| {
                AppError::SerializationError(format!("Invalid timestamp {}: {e}", self.timestamp))
            })?;

        Ok(StoredOfflineAction {
            id: self.id,
            action: OfflineAction {
                kind,
                verb,
                data,
                timestamp,
            },
        })
    }
}

/// INSERT 用に (kind, verb, data, timestamp) の文字列へ変換する
pub(super) fn encode_action(action: &OfflineAction) -> Result<[String; 4], AppError> {
    Ok([
        action.kind.as_str().to_string(),
        action.verb.as_str().to_string(),
        serde_json::to_string(action.data.as_json())?,
        action.timestamp.to_rfc3339(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_unknown_kind_is_rejected() {
        let row = OfflineActionRow {
            id: 1,
            kind: "coupon".into(),
            verb: "add".into(),
            data: "{}".into(),
            timestamp: "2024-05-01T12:00:00+00:00".into(),
        };
        assert!(matches!(
            row.into_stored(),
            Err(AppError::SerializationError(_))
        ));
    }

    #[test]
    fn row_maps_to_stored_action() {
        let row = OfflineActionRow {
            id: 4,
            kind: "cart".into(),
            verb: "remove".into(),
            data: r#"{"productId":"7"}"#.into(),
            timestamp: "2024-05-01T12:00:00+00:00".into(),
        };
        let stored = row.into_stored().unwrap();
        assert_eq!(stored.id, 4);
        assert_eq!(stored.action.kind, OfflineActionKind::Cart);
        assert_eq!(stored.action.verb, OfflineActionVerb::Remove);
        assert_eq!(stored.action.data.product_id().as_deref(), Some("7"));
    }
}
