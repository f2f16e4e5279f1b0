use crate::application::ports::{CacheStorage, NetworkFetcher};
use crate::application::services::connectivity::ConnectivitySignal;
use crate::application::services::offline_queue::OfflineActionQueue;
use crate::application::services::request_classifier::RequestClassifier;
use crate::domain::entities::{ReplayReport, Request, Response, WorkerState};
use crate::domain::value_objects::offline::action_kind::{CART_SYNC_TAG, WISHLIST_SYNC_TAG};
use crate::domain::value_objects::{CacheName, CacheSet, RequestClass};
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use crate::shared::metrics::{AtomicMetric, AtomicSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// ルーターの静的な設定（キャッシュ名・プリキャッシュ対象・フォールバック先）
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub cache_set: CacheSet,
    pub static_manifest: Vec<String>,
    pub placeholder_image: String,
    pub offline_page: String,
}

impl RouterSettings {
    pub fn from_config(config: &CacheConfig) -> Result<Self, AppError> {
        let cache_set = CacheSet::from_config(config).map_err(AppError::ConfigurationError)?;
        Ok(Self {
            cache_set,
            static_manifest: config.static_manifest.clone(),
            placeholder_image: config.placeholder_image.clone(),
            offline_page: config.offline_page.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Sync(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// プレースホルダー画像・ルート文書・オフラインページ
    Fallback,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// 横取りせずブラウザにそのまま任せる
    PassThrough,
    Respond {
        response: Response,
        source: ResponseSource,
        class: RequestClass,
    },
}

impl FetchDisposition {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::PassThrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::PassThrough => None,
            Self::Respond { source, .. } => Some(*source),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Installed { cached: usize },
    Activated { deleted: Vec<String> },
    Fetch(FetchDisposition),
    Sync { replay: Option<ReplayReport> },
}

/// サービスワーカー 1 インスタンス分のキャッシュルーター。
///
/// ライフサイクルは Parsed → Installing → Installed → Activating → Activated で、
/// 失敗時は Redundant になる。フェッチを横取りするのは Activated の間だけ。
pub struct CacheRouter {
    classifier: RequestClassifier,
    settings: RouterSettings,
    caches: Arc<dyn CacheStorage>,
    network: Arc<dyn NetworkFetcher>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
    queue: Option<Arc<OfflineActionQueue>>,
    connectivity: Option<Arc<ConnectivitySignal>>,
    network_metric: AtomicMetric,
}

impl CacheRouter {
    pub fn new(
        classifier: RequestClassifier,
        settings: RouterSettings,
        caches: Arc<dyn CacheStorage>,
        network: Arc<dyn NetworkFetcher>,
    ) -> Self {
        Self {
            classifier,
            settings,
            caches,
            network,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
            queue: None,
            connectivity: None,
            network_metric: AtomicMetric::new(),
        }
    }

    /// `sync` イベントで再送するキュー
    pub fn with_queue(mut self, queue: Arc<OfflineActionQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// ネットワーク失敗を通知する先
    pub fn with_connectivity(mut self, signal: Arc<ConnectivitySignal>) -> Self {
        self.connectivity = Some(signal);
        self
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::Relaxed)
    }

    pub fn network_metrics(&self) -> AtomicSnapshot {
        self.network_metric.snapshot()
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// イベント種別ごとの処理へ振り分ける
    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerOutcome, AppError> {
        match event {
            WorkerEvent::Install => {
                let cached = self.install().await?;
                Ok(WorkerOutcome::Installed { cached })
            }
            WorkerEvent::Activate => {
                let deleted = self.activate().await?;
                Ok(WorkerOutcome::Activated { deleted })
            }
            WorkerEvent::Fetch(request) => Ok(WorkerOutcome::Fetch(self.fetch(&request).await)),
            WorkerEvent::Sync(tag) => Ok(WorkerOutcome::Sync {
                replay: self.sync(&tag).await,
            }),
        }
    }

    /// install → activate を続けて行う。install 成功時は待機せずに有効化する。
    pub async fn start(&self) -> Result<Vec<String>, AppError> {
        self.install().await?;
        if !self.skip_waiting() {
            return Err(AppError::InvalidStateTransition {
                from: WorkerState::Installed.to_string(),
                to: WorkerState::Activating.to_string(),
            });
        }
        self.activate().await
    }

    /// 静的マニフェストをすべて取得してから静的キャッシュへ書き込む。
    /// 1 件でも失敗すれば何も書き込まずに Redundant へ遷移する。
    pub async fn install(&self) -> Result<usize, AppError> {
        self.transition(WorkerState::Installing).await?;

        let mut entries = Vec::with_capacity(self.settings.static_manifest.len());
        for path in &self.settings.static_manifest {
            match self.precache_entry(path).await {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(url = %path, "Install aborted: {}", e);
                    self.transition(WorkerState::Redundant).await?;
                    return Err(AppError::InstallFailed(format!("{path}: {e}")));
                }
            }
        }

        let static_cache = &self.settings.cache_set.static_cache;
        let count = entries.len();
        let written = match self.caches.open(static_cache).await {
            Ok(()) => self.caches.put_all(static_cache, entries).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(cache = %static_cache, "Install aborted while populating cache: {}", e);
            self.transition(WorkerState::Redundant).await?;
            return Err(AppError::InstallFailed(e.to_string()));
        }

        self.transition(WorkerState::Installed).await?;
        self.skip_waiting.store(true, Ordering::Relaxed);
        info!(cache = %static_cache, entries = count, "Service worker installed");
        Ok(count)
    }

    /// 現行セットに含まれないキャッシュをすべて削除し、全クライアントを掌握する
    pub async fn activate(&self) -> Result<Vec<String>, AppError> {
        self.transition(WorkerState::Activating).await?;

        let mut deleted = Vec::new();
        for name in self.caches.keys().await {
            if self.settings.cache_set.contains(&name) {
                continue;
            }
            if self.caches.delete(&name).await {
                info!(cache = %name, "Deleted stale cache");
                deleted.push(name);
            } else {
                warn!(cache = %name, "Failed to delete stale cache");
            }
        }

        self.clients_claimed.store(true, Ordering::Relaxed);
        self.transition(WorkerState::Activated).await?;
        info!(deleted = deleted.len(), "Service worker activated; clients claimed");
        Ok(deleted)
    }

    pub async fn fetch(&self, request: &Request) -> FetchDisposition {
        if !self.state().await.can_intercept_fetch() {
            return FetchDisposition::PassThrough;
        }
        if !request.is_get() {
            debug!(method = %request.method, url = %request.url, "Passing through non-GET request");
            return FetchDisposition::PassThrough;
        }

        let url = match self.classifier.resolve(&request.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %request.url, "Passing through unresolvable request: {}", e);
                return FetchDisposition::PassThrough;
            }
        };

        let class = self.classifier.classify(request, &url);
        debug!(url = %url, class = %class, strategy = ?class.strategy(), "Routing request");

        let (response, source) = match class {
            RequestClass::Image => self.serve_image(request, &url).await,
            RequestClass::Dynamic => self.serve_dynamic(request, &url).await,
            RequestClass::Navigation => self.serve_navigation(request, &url).await,
            RequestClass::Static => self.serve_static(request, &url).await,
        };

        FetchDisposition::Respond {
            response,
            source,
            class,
        }
    }

    /// `cart-sync` / `wishlist-sync` でキューを再送する。その他のタグは無視。
    pub async fn sync(&self, tag: &str) -> Option<ReplayReport> {
        if tag != CART_SYNC_TAG && tag != WISHLIST_SYNC_TAG {
            debug!(tag, "Ignoring unknown sync tag");
            return None;
        }
        let Some(queue) = self.queue.as_ref() else {
            debug!(tag, "Sync event without an attached queue");
            return None;
        };

        info!(tag, "Background sync fired");
        Some(queue.replay_pending().await)
    }

    async fn serve_image(&self, request: &Request, url: &Url) -> (Response, ResponseSource) {
        if let Some(cached) = self.caches.match_any(url.as_str()).await {
            return (cached, ResponseSource::Cache);
        }

        match self.fetch_network(request, url).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_cache(&self.settings.cache_set.image_cache, url, &response)
                        .await;
                }
                (response, ResponseSource::Network)
            }
            Err(_) => match self.cached_path(&self.settings.placeholder_image).await {
                Some(placeholder) => (placeholder, ResponseSource::Fallback),
                None => (
                    Response::synthetic(404, "Not Found"),
                    ResponseSource::Synthetic,
                ),
            },
        }
    }

    async fn serve_dynamic(&self, request: &Request, url: &Url) -> (Response, ResponseSource) {
        match self.fetch_network(request, url).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_cache(&self.settings.cache_set.dynamic_cache, url, &response)
                        .await;
                }
                (response, ResponseSource::Network)
            }
            Err(_) => match self.caches.match_any(url.as_str()).await {
                Some(cached) => (cached, ResponseSource::Cache),
                None => (
                    Response::synthetic(503, "Service Unavailable"),
                    ResponseSource::Synthetic,
                ),
            },
        }
    }

    async fn serve_navigation(&self, request: &Request, url: &Url) -> (Response, ResponseSource) {
        match self.fetch_network(request, url).await {
            Ok(response) => (response, ResponseSource::Network),
            Err(_) => {
                if let Some(cached) = self.caches.match_any(url.as_str()).await {
                    return (cached, ResponseSource::Cache);
                }
                if let Some(root) = self.cached_path("/").await {
                    return (root, ResponseSource::Fallback);
                }
                if let Some(offline) = self.cached_path(&self.settings.offline_page).await {
                    return (offline, ResponseSource::Fallback);
                }
                (
                    Response::synthetic(503, "Service Unavailable"),
                    ResponseSource::Synthetic,
                )
            }
        }
    }

    async fn serve_static(&self, request: &Request, url: &Url) -> (Response, ResponseSource) {
        if let Some(cached) = self.caches.match_any(url.as_str()).await {
            return (cached, ResponseSource::Cache);
        }

        match self.fetch_network(request, url).await {
            Ok(response) => {
                if response.is_success() {
                    self.write_cache(&self.settings.cache_set.static_cache, url, &response)
                        .await;
                }
                (response, ResponseSource::Network)
            }
            Err(_) => (
                Response::synthetic(503, "Service Unavailable"),
                ResponseSource::Synthetic,
            ),
        }
    }

    async fn precache_entry(&self, path: &str) -> Result<(String, Response), AppError> {
        let url = self.classifier.resolve(path)?;
        let request = Request::get(url.as_str());
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(AppError::Network(format!(
                "unexpected status {}",
                response.status
            )));
        }
        Ok((url.into(), response))
    }

    async fn fetch_network(&self, request: &Request, url: &Url) -> Result<Response, AppError> {
        let outgoing = request.clone().with_url(url.as_str());
        match self.network.fetch(&outgoing).await {
            Ok(response) => {
                self.network_metric.record_success();
                Ok(response)
            }
            Err(e) => {
                self.network_metric.record_failure();
                if let Some(signal) = self.connectivity.as_ref() {
                    signal.record_fetch_failure();
                }
                debug!(url = %url, "Network fetch failed: {}", e);
                Err(e)
            }
        }
    }

    async fn cached_path(&self, path: &str) -> Option<Response> {
        let url = self.classifier.resolve(path).ok()?;
        self.caches.match_any(url.as_str()).await
    }

    /// 書き込みに失敗してもレスポンスはそのまま返す
    async fn write_cache(&self, cache: &CacheName, url: &Url, response: &Response) {
        if let Err(e) = self.put_response(cache, url, response).await {
            warn!("{}", e);
        }
    }

    async fn put_response(
        &self,
        cache: &CacheName,
        url: &Url,
        response: &Response,
    ) -> Result<(), AppError> {
        self.caches
            .put(cache, url.as_str(), response.clone())
            .await
            .map_err(|e| AppError::CacheWrite(format!("{cache} {url}: {e}")))
    }

    async fn transition(&self, next: WorkerState) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if !state.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition {
                from: state.to_string(),
                to: next.to_string(),
            });
        }
        let from = *state;
        debug!(from = %from, to = %next, "Worker state transition");
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RequestMethod;
    use crate::infrastructure::cache::MemoryCacheStorage;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// 指定したパス以外はすべて 200 を返すネットワーク
    struct StubNetwork {
        failing: HashSet<String>,
    }

    #[async_trait]
    impl NetworkFetcher for StubNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, AppError> {
            let path = Url::parse(&request.url)
                .map(|u| u.path().to_string())
                .unwrap_or_default();
            if self.failing.contains(&path) {
                return Err(AppError::Network("connection refused".into()));
            }
            Ok(Response::ok(format!("body of {path}")))
        }
    }

    /// `put` だけが失敗するキャッシュ
    struct ReadOnlyCaches(MemoryCacheStorage);

    #[async_trait]
    impl CacheStorage for ReadOnlyCaches {
        async fn open(&self, name: &CacheName) -> Result<(), AppError> {
            self.0.open(name).await
        }
        async fn keys(&self) -> Vec<String> {
            self.0.keys().await
        }
        async fn has(&self, name: &str) -> bool {
            self.0.has(name).await
        }
        async fn delete(&self, name: &str) -> bool {
            self.0.delete(name).await
        }
        async fn match_in(&self, name: &CacheName, url: &str) -> Option<Response> {
            self.0.match_in(name, url).await
        }
        async fn match_any(&self, url: &str) -> Option<Response> {
            self.0.match_any(url).await
        }
        async fn put(
            &self,
            _name: &CacheName,
            _url: &str,
            _response: Response,
        ) -> Result<(), AppError> {
            Err(AppError::Internal("quota exceeded".into()))
        }
        async fn put_all(
            &self,
            name: &CacheName,
            entries: Vec<(String, Response)>,
        ) -> Result<(), AppError> {
            self.0.put_all(name, entries).await
        }
    }

    fn router(failing: &[&str]) -> CacheRouter {
        let config = CacheConfig::default();
        let classifier = RequestClassifier::from_config("https://shop.example", &config).unwrap();
        let settings = RouterSettings::from_config(&config).unwrap();
        let network = StubNetwork {
            failing: failing.iter().map(|p| p.to_string()).collect(),
        };
        CacheRouter::new(
            classifier,
            settings,
            Arc::new(MemoryCacheStorage::new()),
            Arc::new(network),
        )
    }

    #[tokio::test]
    async fn start_moves_worker_to_activated() {
        let router = router(&[]);
        assert_eq!(router.state().await, WorkerState::Parsed);

        router.start().await.unwrap();

        assert_eq!(router.state().await, WorkerState::Activated);
        assert!(router.skip_waiting());
        assert!(router.clients_claimed());
    }

    #[tokio::test]
    async fn failed_precache_makes_worker_redundant() {
        let router = router(&["/favicon.ico"]);

        let result = router.install().await;

        assert!(matches!(result, Err(AppError::InstallFailed(_))));
        assert_eq!(router.state().await, WorkerState::Redundant);
        assert!(router.activate().await.is_err());
    }

    #[tokio::test]
    async fn activate_requires_install_first() {
        let router = router(&[]);
        let result = router.activate().await;
        assert!(matches!(
            result,
            Err(AppError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_passes_through_before_activation() {
        let router = router(&[]);
        let disposition = router.fetch(&Request::get("/index.html")).await;
        assert_eq!(disposition, FetchDisposition::PassThrough);
    }

    #[tokio::test]
    async fn non_get_requests_are_not_intercepted() {
        let router = router(&[]);
        router.start().await.unwrap();

        let disposition = router
            .fetch(&Request::new(RequestMethod::Post, "/api/cart"))
            .await;

        assert_eq!(disposition, FetchDisposition::PassThrough);
    }

    #[tokio::test]
    async fn precached_shell_is_served_from_cache() {
        let router = router(&[]);
        router.start().await.unwrap();

        let disposition = router.fetch(&Request::get("/manifest.json")).await;

        assert_eq!(disposition.source(), Some(ResponseSource::Cache));
        assert_eq!(
            disposition.response().map(|r| r.body_text()).as_deref(),
            Some("body of /manifest.json")
        );
    }

    #[tokio::test]
    async fn cache_write_failure_still_returns_network_response() {
        let config = CacheConfig::default();
        let router = CacheRouter::new(
            RequestClassifier::from_config("https://shop.example", &config).unwrap(),
            RouterSettings::from_config(&config).unwrap(),
            Arc::new(ReadOnlyCaches(MemoryCacheStorage::new())),
            Arc::new(StubNetwork {
                failing: HashSet::new(),
            }),
        );
        router.start().await.unwrap();

        let disposition = router.fetch(&Request::get("/api/products")).await;
        assert_eq!(disposition.source(), Some(ResponseSource::Network));

        let url = Url::parse("https://shop.example/api/products").unwrap();
        let result = router
            .put_response(
                &router.settings().cache_set.dynamic_cache,
                &url,
                &Response::ok("x"),
            )
            .await;
        assert!(matches!(result, Err(AppError::CacheWrite(_))));
    }

    #[tokio::test]
    async fn unknown_sync_tag_is_ignored() {
        let router = router(&[]);
        assert!(router.sync("newsletter-sync").await.is_none());
        // キュー未接続でも既知タグは失敗しない
        assert!(router.sync(CART_SYNC_TAG).await.is_none());
    }

    #[tokio::test]
    async fn handle_dispatches_lifecycle_events() {
        let router = router(&[]);

        let installed = router.handle(WorkerEvent::Install).await.unwrap();
        assert!(matches!(installed, WorkerOutcome::Installed { cached: 6 }));

        let activated = router.handle(WorkerEvent::Activate).await.unwrap();
        assert!(matches!(activated, WorkerOutcome::Activated { ref deleted } if deleted.is_empty()));

        let fetched = router
            .handle(WorkerEvent::Fetch(Request::get("/favicon.ico")))
            .await
            .unwrap();
        assert!(matches!(
            fetched,
            WorkerOutcome::Fetch(FetchDisposition::Respond {
                source: ResponseSource::Cache,
                class: RequestClass::Static,
                ..
            })
        ));
    }
}
