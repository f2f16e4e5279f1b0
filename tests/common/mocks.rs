use async_trait::async_trait;
use printpoka_offline::application::ports::{ActionExecutor, NetworkFetcher};
use printpoka_offline::domain::entities::{OfflineAction, Request, Response};
use printpoka_offline::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// URL ごとに応答を差し込めるネットワーク。呼び出し回数も数える。
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    unreachable: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<HashMap<String, usize>>,
}

#[allow(dead_code)]
impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, response: Response) -> Self {
        self.set_route(url, response);
        self
    }

    pub fn set_route(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn unreachable(self, url: &str) -> Self {
        self.unreachable.lock().unwrap().insert(url.to_string());
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl NetworkFetcher for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, AppError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_default() += 1;

        if self.offline.load(Ordering::SeqCst)
            || self.unreachable.lock().unwrap().contains(&request.url)
        {
            return Err(AppError::Network(format!("{} unreachable", request.url)));
        }

        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "missing")))
    }
}

/// 実行されたアクションを記録する。指定した productId は失敗させる。
#[derive(Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<OfflineAction>>,
    failing_products: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_product(&self, product_id: &str) {
        self.failing_products
            .lock()
            .unwrap()
            .insert(product_id.to_string());
    }

    /// 1 件ごとに待たせる
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn executed(&self) -> Vec<OfflineAction> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: &OfflineAction) -> Result<(), AppError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.executed.lock().unwrap().push(action.clone());
        let product = action.data.product_id().unwrap_or_default();
        if self.failing_products.lock().unwrap().contains(&product) {
            return Err(AppError::Network(format!("cannot sync product {product}")));
        }
        Ok(())
    }
}
