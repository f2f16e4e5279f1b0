use crate::domain::entities::{Request, Response};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// ネットワーク到達不能時は `AppError::Network` を返す。HTTP エラーステータスは `Ok`。
    async fn fetch(&self, request: &Request) -> Result<Response, AppError>;
}
