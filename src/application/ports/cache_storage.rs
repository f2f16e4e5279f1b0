use crate::domain::entities::Response;
use crate::domain::value_objects::CacheName;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 名前付きキャッシュ群（`CacheStorage` 相当）のポート。エントリは URL をキーとする。
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// 無ければ作成する
    async fn open(&self, name: &CacheName) -> Result<(), AppError>;

    async fn keys(&self) -> Vec<String>;

    async fn has(&self, name: &str) -> bool;

    async fn delete(&self, name: &str) -> bool;

    async fn match_in(&self, name: &CacheName, url: &str) -> Option<Response>;

    /// すべてのキャッシュを順に探す
    async fn match_any(&self, url: &str) -> Option<Response>;

    async fn put(&self, name: &CacheName, url: &str, response: Response) -> Result<(), AppError>;

    /// 全件をまとめて書き込む。途中で失敗した場合は何も書き込まない。
    async fn put_all(
        &self,
        name: &CacheName,
        entries: Vec<(String, Response)>,
    ) -> Result<(), AppError>;
}
