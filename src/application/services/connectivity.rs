use crate::application::services::offline_queue::OfflineActionQueue;
use crate::domain::entities::ReplayReport;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

/// 「現在オンラインか」を表す単一のシグナル。
/// 値を変えるのは `online`/`offline` イベントだけで、ポーリングはしない。
#[derive(Debug)]
pub struct ConnectivitySignal {
    tx: watch::Sender<bool>,
    fetch_failures: AtomicU64,
}

impl ConnectivitySignal {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self {
            tx,
            fetch_failures: AtomicU64::new(0),
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// 値が変わった場合に `true`
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.tx.send_replace(online);
        previous != online
    }

    /// ネットワーク起因のフェッチ失敗を数える。オンライン状態は変えない。
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }
}

/// ブラウザの online/offline イベントを受け取り、オンライン復帰時にキューを再送する。
/// 再送のきっかけはここだけ。
pub struct ConnectivityObserver {
    signal: Arc<ConnectivitySignal>,
    queue: Arc<OfflineActionQueue>,
}

impl ConnectivityObserver {
    pub fn new(signal: Arc<ConnectivitySignal>, queue: Arc<OfflineActionQueue>) -> Self {
        Self { signal, queue }
    }

    pub fn signal(&self) -> Arc<ConnectivitySignal> {
        Arc::clone(&self.signal)
    }

    pub fn is_online(&self) -> bool {
        self.signal.is_online()
    }

    /// イベントを 1 件処理する。`Online` の場合は再送の完了まで待つ。
    ///
    /// デバウンスはしないため、`online` が届くたびに再送を 1 回呼び出す。
    pub async fn handle(&self, event: ConnectivityEvent) -> Option<ReplayReport> {
        match event {
            ConnectivityEvent::Online => {
                self.signal.set_online(true);
                info!("Connectivity restored; replaying pending offline actions");
                Some(self.queue.replay_pending().await)
            }
            ConnectivityEvent::Offline => {
                if self.signal.set_online(false) {
                    info!("Connectivity lost");
                } else {
                    debug!("Offline event while already offline");
                }
                None
            }
        }
    }

    /// イベントチャネルを消費するループを起動する。
    ///
    /// `Online` ごとに再送タスクを spawn するので、後続の `Offline` は待たされない。
    /// 実行中の再送は取り消さない。
    pub fn spawn(self: Arc<Self>, mut events: mpsc::Receiver<ConnectivityEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    ConnectivityEvent::Online => {
                        self.signal.set_online(true);
                        let queue = Arc::clone(&self.queue);
                        tokio::spawn(async move {
                            let report = queue.replay_pending().await;
                            if report.failed > 0 {
                                warn!(
                                    failed = report.failed,
                                    attempted = report.attempted,
                                    "Replay finished with failures"
                                );
                            }
                        });
                    }
                    ConnectivityEvent::Offline => {
                        self.handle(ConnectivityEvent::Offline).await;
                    }
                }
            }

            debug!("Connectivity event loop terminated");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_reports_changes_only_on_transition() {
        let signal = ConnectivitySignal::new(true);
        assert!(signal.is_online());
        assert!(!signal.set_online(true));
        assert!(signal.set_online(false));
        assert!(!signal.is_online());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let signal = ConnectivitySignal::new(false);
        let mut rx = signal.subscribe();

        signal.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }

    #[test]
    fn fetch_failures_do_not_flip_the_flag() {
        let signal = ConnectivitySignal::new(true);
        signal.record_fetch_failure();
        signal.record_fetch_failure();
        assert_eq!(signal.fetch_failures(), 2);
        assert!(signal.is_online());
    }
}
