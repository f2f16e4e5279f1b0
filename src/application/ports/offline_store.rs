use crate::domain::entities::{NewOfflineRecord, OfflineAction, StoredOfflineAction};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 保留中オフラインアクションの永続化ポート。
///
/// 初期化前は `append` が `StorageUnavailable` で失敗し、`read_all` は空を返し、
/// `clear` は `false` を返す。
#[async_trait]
pub trait OfflineActionStore: Send + Sync {
    async fn initialize(&self) -> Result<(), AppError>;

    async fn is_ready(&self) -> bool;

    async fn append(&self, record: NewOfflineRecord) -> Result<StoredOfflineAction, AppError>;

    async fn read_all(&self) -> Result<Vec<StoredOfflineAction>, AppError>;

    async fn clear(&self) -> bool;

    /// 全件を消して `actions` だけを書き戻す
    async fn replace_all(&self, actions: &[OfflineAction]) -> bool;
}
