use crate::application::ports::BackgroundSyncRegistrar;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// 登録されたタグをチャネルへ流すだけの同期登録器。
/// 受信側が `CacheRouter::sync` を呼び出して `sync` イベントを再現する。
///
/// 未配送のタグと同じタグの登録はまとめられ、チャネルには 1 つしか流れない。
#[derive(Debug, Clone)]
pub struct ChannelBackgroundSync {
    tx: mpsc::UnboundedSender<String>,
    undelivered: Arc<Mutex<HashSet<String>>>,
}

/// `ChannelBackgroundSync` の受信側
#[derive(Debug)]
pub struct SyncTagReceiver {
    rx: mpsc::UnboundedReceiver<String>,
    undelivered: Arc<Mutex<HashSet<String>>>,
}

impl ChannelBackgroundSync {
    pub fn channel() -> (Self, SyncTagReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let undelivered = Arc::new(Mutex::new(HashSet::new()));
        (
            Self {
                tx,
                undelivered: Arc::clone(&undelivered),
            },
            SyncTagReceiver { rx, undelivered },
        )
    }
}

impl SyncTagReceiver {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// 配送済みにする。以降の同じタグの登録は再びチャネルへ流れる。
    pub async fn mark_delivered(&self, tag: &str) {
        self.undelivered.lock().await.remove(tag);
    }

    pub async fn undelivered_count(&self) -> usize {
        self.undelivered.lock().await.len()
    }
}

#[async_trait]
impl BackgroundSyncRegistrar for ChannelBackgroundSync {
    async fn register(&self, tag: &str) -> Result<(), AppError> {
        let mut undelivered = self.undelivered.lock().await;
        if !undelivered.insert(tag.to_string()) {
            debug!(tag, "Sync tag already pending");
            return Ok(());
        }

        if self.tx.send(tag.to_string()).is_err() {
            undelivered.remove(tag);
            return Err(AppError::Internal(
                "Background sync receiver dropped".to_string(),
            ));
        }
        debug!(tag, "Sync tag queued");
        Ok(())
    }
}

/// 機能検出。無効なら `None` を返し、キューは online/offline イベントだけで動く。
pub fn detect_background_sync(
    enabled: bool,
) -> (
    Option<Arc<dyn BackgroundSyncRegistrar>>,
    Option<SyncTagReceiver>,
) {
    if !enabled {
        return (None, None);
    }
    let (registrar, rx) = ChannelBackgroundSync::channel();
    (Some(Arc::new(registrar)), Some(rx))
}
