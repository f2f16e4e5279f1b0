use crate::application::ports::OfflineActionStore;
use crate::domain::entities::{NewOfflineRecord, OfflineAction, StoredOfflineAction};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct MemoryState {
    initialized: bool,
    next_id: i64,
    records: Vec<StoredOfflineAction>,
}

/// プロセス内だけで保持するストア。永続化が使えない環境とテスト向け。
#[derive(Default)]
pub struct MemoryOfflineActionStore {
    state: RwLock<MemoryState>,
}

impl MemoryOfflineActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[async_trait]
impl OfflineActionStore for MemoryOfflineActionStore {
    async fn initialize(&self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if !state.initialized {
            state.initialized = true;
            state.next_id = 1;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.state.read().await.initialized
    }

    async fn append(&self, record: NewOfflineRecord) -> Result<StoredOfflineAction, AppError> {
        let mut state = self.state.write().await;
        if !state.initialized {
            return Err(AppError::StorageUnavailable(
                "Offline store is not initialized".to_string(),
            ));
        }

        let stored = StoredOfflineAction {
            id: state.next_id,
            action: record.into_action(Utc::now()),
        };
        state.next_id += 1;
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn read_all(&self) -> Result<Vec<StoredOfflineAction>, AppError> {
        Ok(self.state.read().await.records.clone())
    }

    async fn clear(&self) -> bool {
        let mut state = self.state.write().await;
        if !state.initialized {
            return false;
        }
        state.records.clear();
        true
    }

    async fn replace_all(&self, actions: &[OfflineAction]) -> bool {
        let mut state = self.state.write().await;
        if !state.initialized {
            return false;
        }

        state.records.clear();
        for action in actions {
            let id = state.next_id;
            state.next_id += 1;
            state.records.push(StoredOfflineAction {
                id,
                action: action.clone(),
            });
        }
        true
    }
}
