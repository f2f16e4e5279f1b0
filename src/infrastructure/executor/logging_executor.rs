use crate::application::ports::ActionExecutor;
use crate::domain::entities::OfflineAction;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// 実行内容をログに出すだけの実行器。CLI と動作確認用。
#[derive(Debug, Default)]
pub struct LoggingActionExecutor {
    executed: AtomicU64,
}

impl LoggingActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ActionExecutor for LoggingActionExecutor {
    async fn execute(&self, action: &OfflineAction) -> Result<(), AppError> {
        self.executed.fetch_add(1, Ordering::Relaxed);
        info!(
            action = %action.label(),
            timestamp = %action.timestamp.to_rfc3339(),
            data = %action.data.as_json(),
            "Executing action"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OfflineActionDraft;
    use crate::domain::value_objects::{OfflineActionKind, OfflineActionVerb, OfflinePayload};
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn counts_executions() {
        let executor = LoggingActionExecutor::new();
        let action = OfflineActionDraft::new(
            OfflineActionKind::Order,
            OfflineActionVerb::Update,
            OfflinePayload::new(json!({"orderId": "A-1"})).unwrap(),
        )
        .stamp(Utc::now());

        executor.execute(&action).await.unwrap();
        executor.execute(&action).await.unwrap();

        assert_eq!(executor.executed(), 2);
    }
}
