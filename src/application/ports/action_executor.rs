use crate::domain::entities::OfflineAction;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// アクション種別に応じた実際の API 呼び出しを差し込む境界
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &OfflineAction) -> Result<(), AppError>;
}
