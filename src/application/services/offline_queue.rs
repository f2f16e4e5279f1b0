use crate::application::ports::{ActionExecutor, BackgroundSyncRegistrar, OfflineActionStore};
use crate::application::services::connectivity::ConnectivitySignal;
use crate::domain::entities::{
    EnqueueOutcome, NewOfflineRecord, OfflineAction, OfflineActionDraft, OfflineStatus,
    ReplayReport,
};
use crate::domain::value_objects::ReplayPolicy;
use crate::shared::error::AppError;
use crate::shared::metrics::{ReplayMetrics, ReplayMetricsSnapshot};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// オフライン中のユーザー操作を保留し、オンライン復帰時に再送するキュー。
///
/// 保留リストは 1 つの非同期 Mutex で守られており、`enqueue` と
/// `replay_pending` が途中で入り混じることはない。ストアへの書き込みも
/// ロックを保持したまま行うので、メモリ上のリストとストアは呼び出し側から見て
/// 常に揃っている。件数だけは別に持ち、再送中でも `status` はロックを待たない。
pub struct OfflineActionQueue {
    store: Arc<dyn OfflineActionStore>,
    executor: Arc<dyn ActionExecutor>,
    connectivity: Arc<ConnectivitySignal>,
    background_sync: Option<Arc<dyn BackgroundSyncRegistrar>>,
    policy: ReplayPolicy,
    pending: Mutex<VecDeque<OfflineAction>>,
    pending_count: AtomicUsize,
    metrics: ReplayMetrics,
}

impl OfflineActionQueue {
    pub fn new(
        store: Arc<dyn OfflineActionStore>,
        executor: Arc<dyn ActionExecutor>,
        connectivity: Arc<ConnectivitySignal>,
    ) -> Self {
        Self {
            store,
            executor,
            connectivity,
            background_sync: None,
            policy: ReplayPolicy::default(),
            pending: Mutex::new(VecDeque::new()),
            pending_count: AtomicUsize::new(0),
            metrics: ReplayMetrics::new(),
        }
    }

    pub fn with_policy(mut self, policy: ReplayPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 機能検出の結果をそのまま渡す。`None` でも online/offline だけで動作する。
    pub fn with_background_sync(
        mut self,
        registrar: Option<Arc<dyn BackgroundSyncRegistrar>>,
    ) -> Self {
        self.background_sync = registrar;
        self
    }

    pub fn policy(&self) -> ReplayPolicy {
        self.policy
    }

    /// ストアに残っているアクションでメモリ上のリストを置き換える
    pub async fn load_pending(&self) -> Result<usize, AppError> {
        let stored = self.store.read_all().await?;
        let mut pending = self.pending.lock().await;
        pending.clear();
        pending.extend(stored.into_iter().map(|record| record.action));
        self.pending_count.store(pending.len(), Ordering::Release);

        debug!(count = pending.len(), "Loaded pending offline actions");
        Ok(pending.len())
    }

    /// 変更要求を受け付ける。
    ///
    /// オンラインなら即時実行し、永続化はしない（失敗してもログのみで再試行しない）。
    /// オフラインならストアに書き込み、保留リストの末尾に積む。
    pub async fn enqueue(&self, draft: OfflineActionDraft) -> EnqueueOutcome {
        let action = draft.stamp(Utc::now());

        if self.connectivity.is_online() {
            let success = match self.executor.execute(&action).await {
                Ok(()) => true,
                Err(e) => {
                    error!(action = %action.label(), "Failed to execute action: {}", e);
                    false
                }
            };
            return EnqueueOutcome::Executed { success };
        }

        let (persisted, pending_count) = {
            let mut pending = self.pending.lock().await;
            let persisted = match self.store.append(NewOfflineRecord::from(&action)).await {
                Ok(stored) => {
                    debug!(id = stored.id, action = %action.label(), "Offline action persisted");
                    true
                }
                Err(e) => {
                    warn!(action = %action.label(), "Failed to persist offline action: {}", e);
                    false
                }
            };
            pending.push_back(action.clone());
            self.pending_count.store(pending.len(), Ordering::Release);
            (persisted, pending.len())
        };

        info!(
            action = %action.label(),
            pending = pending_count,
            "Queued offline action"
        );

        self.register_background_sync(&action).await;

        EnqueueOutcome::Queued {
            persisted,
            pending: pending_count,
        }
    }

    /// 保留中のアクションを登録順に 1 件ずつ実行する。
    ///
    /// 個々の失敗はログに残してループを続ける。`ClearAll` ではその後リストと
    /// ストアを無条件に空にし、`RetainFailed` では失敗分だけを残す。
    pub async fn replay_pending(&self) -> ReplayReport {
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return ReplayReport::default();
        }

        let started = Instant::now();
        let batch: Vec<OfflineAction> = pending.drain(..).collect();
        info!(count = batch.len(), policy = %self.policy, "Replaying pending offline actions");

        let mut succeeded = 0;
        let mut failed = Vec::new();
        for action in batch.iter() {
            match self.replay_one(action).await {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    error!(
                        action = %action.label(),
                        timestamp = %action.timestamp.to_rfc3339(),
                        "{}",
                        e
                    );
                    failed.push(action.clone());
                }
            }
        }

        let failed_count = failed.len();
        let (store_cleared, retained) = match self.policy {
            ReplayPolicy::ClearAll => (self.store.clear().await, 0),
            ReplayPolicy::RetainFailed if failed.is_empty() => (self.store.clear().await, 0),
            ReplayPolicy::RetainFailed => {
                if !self.store.replace_all(&failed).await {
                    warn!(
                        retained = failed_count,
                        "Failed to rewrite retained actions, re-appending them"
                    );
                    self.reappend_retained(&failed).await;
                }
                pending.extend(failed);
                (false, failed_count)
            }
        };
        self.pending_count.store(pending.len(), Ordering::Release);

        if !store_cleared && retained == 0 {
            warn!("Offline store clear reported failure; contents may be stale");
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        self.metrics
            .record(succeeded as u64, failed_count as u64, duration_ms);

        ReplayReport {
            attempted: batch.len(),
            succeeded,
            failed: failed_count,
            retained,
            store_cleared,
            duration_ms,
            policy: Some(self.policy),
        }
    }

    /// 再送中は、実行中のバッチを完了まで保留件数に含める
    pub async fn status(&self) -> OfflineStatus {
        OfflineStatus::new(
            self.connectivity.is_online(),
            self.pending_count.load(Ordering::Acquire),
        )
    }

    pub async fn pending_actions(&self) -> Vec<OfflineAction> {
        self.pending.lock().await.iter().cloned().collect()
    }

    pub fn metrics(&self) -> ReplayMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn replay_one(&self, action: &OfflineAction) -> Result<(), AppError> {
        self.executor
            .execute(action)
            .await
            .map_err(|e| AppError::ReplayFailure(format!("{}: {e}", action.label())))
    }

    /// 一括の書き戻しに失敗したとき、消去と追記で失敗分だけをストアに残す
    async fn reappend_retained(&self, failed: &[OfflineAction]) {
        if !self.store.clear().await {
            warn!("Offline store could not be cleared, replayed actions may run again");
            return;
        }
        for action in failed {
            if let Err(e) = self.store.append(NewOfflineRecord::from(action)).await {
                warn!(action = %action.label(), "Failed to re-append retained action: {}", e);
            }
        }
    }

    async fn register_background_sync(&self, action: &OfflineAction) {
        let Some(registrar) = self.background_sync.as_ref() else {
            debug!("Background sync not supported");
            return;
        };
        let Some(tag) = action.kind.sync_tag() else {
            return;
        };

        match registrar.register(tag).await {
            Ok(()) => debug!(tag, "Background sync registered"),
            Err(e) => warn!(tag, "Background sync registration failed: {}", e),
        }
    }
}
