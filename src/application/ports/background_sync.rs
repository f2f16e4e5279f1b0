use crate::shared::error::AppError;
use async_trait::async_trait;

/// ホストが提供する場合のみ存在するバックグラウンド同期機能
#[async_trait]
pub trait BackgroundSyncRegistrar: Send + Sync {
    async fn register(&self, tag: &str) -> Result<(), AppError>;
}
