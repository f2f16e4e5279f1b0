use crate::application::ports::{ActionExecutor, NetworkFetcher, OfflineActionStore};
use crate::application::services::{
    CacheRouter, ConnectivityObserver, ConnectivitySignal, OfflineActionQueue, RequestClassifier,
    RouterSettings,
};
use crate::infrastructure::cache::MemoryCacheStorage;
use crate::infrastructure::executor::LoggingActionExecutor;
use crate::infrastructure::network::HttpFetcher;
use crate::infrastructure::offline::SqliteOfflineActionStore;
use crate::infrastructure::sync::{SyncTagReceiver, detect_background_sync};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub connectivity: Arc<ConnectivitySignal>,
    pub store: Arc<dyn OfflineActionStore>,
    pub queue: Arc<OfflineActionQueue>,
    pub observer: Arc<ConnectivityObserver>,
    pub caches: Arc<MemoryCacheStorage>,
    pub router: Arc<CacheRouter>,
    sync_rx: Arc<Mutex<Option<SyncTagReceiver>>>,
}

impl AppState {
    /// 実ネットワークとログ出力のみの実行器で組み立てる
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let network: Arc<dyn NetworkFetcher> = Arc::new(HttpFetcher::from_config(&config.network)?);
        let executor: Arc<dyn ActionExecutor> = Arc::new(LoggingActionExecutor::new());
        Self::with_components(config, executor, network).await
    }

    pub async fn with_components(
        config: AppConfig,
        executor: Arc<dyn ActionExecutor>,
        network: Arc<dyn NetworkFetcher>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let store: Arc<dyn OfflineActionStore> =
            Arc::new(SqliteOfflineActionStore::from_config(&config.storage)?);
        // ストアが開けなくてもキューはメモリ上で動かす
        if let Err(e) = store.initialize().await {
            warn!("Offline store unavailable, queueing in memory only: {}", e);
        }

        let connectivity = Arc::new(ConnectivitySignal::new(config.network.start_online));
        let (registrar, sync_rx) = detect_background_sync(config.queue.background_sync);

        let queue = Arc::new(
            OfflineActionQueue::new(Arc::clone(&store), executor, Arc::clone(&connectivity))
                .with_policy(config.queue.replay_policy)
                .with_background_sync(registrar),
        );
        if store.is_ready().await {
            let restored = queue.load_pending().await?;
            info!(restored, "Restored pending offline actions");
        }

        let observer = Arc::new(ConnectivityObserver::new(
            Arc::clone(&connectivity),
            Arc::clone(&queue),
        ));

        let caches = Arc::new(MemoryCacheStorage::new());
        let classifier = RequestClassifier::from_config(&config.network.origin, &config.cache)?;
        let settings = RouterSettings::from_config(&config.cache)?;
        let router = Arc::new(
            CacheRouter::new(classifier, settings, caches.clone(), network)
                .with_queue(Arc::clone(&queue))
                .with_connectivity(Arc::clone(&connectivity)),
        );

        Ok(Self {
            config: Arc::new(config),
            connectivity,
            store,
            queue,
            observer,
            caches,
            router,
            sync_rx: Arc::new(Mutex::new(sync_rx)),
        })
    }

    /// 登録された同期タグを、オンラインになってからルーターの `sync` に渡す。
    /// 渡す直前にタグを配送済みにするので、オフライン中の重複登録は 1 回の同期になる。
    /// 既に起動済み、またはバックグラウンド同期が無効なら `None`。
    pub async fn spawn_sync_dispatcher(&self) -> Option<JoinHandle<()>> {
        let mut rx = self.sync_rx.lock().await.take()?;
        let router = Arc::clone(&self.router);
        let mut online = self.connectivity.subscribe();

        Some(tokio::spawn(async move {
            while let Some(tag) = rx.recv().await {
                let ready = online.wait_for(|is_online| *is_online).await.is_ok();
                if !ready {
                    break;
                }
                rx.mark_delivered(&tag).await;
                router.sync(&tag).await;
            }
        }))
    }
}
