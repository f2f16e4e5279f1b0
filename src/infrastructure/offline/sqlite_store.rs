use super::rows::{encode_action, OfflineActionRow};
use crate::application::ports::OfflineActionStore;
use crate::domain::entities::{NewOfflineRecord, OfflineAction, StoredOfflineAction};
use crate::shared::config::{is_identifier, StorageConfig};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// SQLite に保留アクションを保存するストア。
///
/// テーブル名はストア名そのもので、SQL 中では常に引用符で囲む。スキーマの
/// バージョンは `PRAGMA user_version` に記録する。`initialize` が成功するまでは
/// 未初期化として振る舞う。
pub struct SqliteOfflineActionStore {
    database_url: String,
    store_name: String,
    schema_version: u32,
    pool: RwLock<Option<Pool<Sqlite>>>,
}

impl SqliteOfflineActionStore {
    pub fn new(
        database_url: impl Into<String>,
        store_name: impl Into<String>,
        schema_version: u32,
    ) -> Result<Self, AppError> {
        let store_name = store_name.into();
        if !is_identifier(&store_name) {
            return Err(AppError::ConfigurationError(format!(
                "Store name must be an identifier: {store_name}"
            )));
        }
        if schema_version == 0 {
            return Err(AppError::ConfigurationError(
                "Schema version must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            database_url: database_url.into(),
            store_name,
            schema_version,
            pool: RwLock::new(None),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        Self::new(config.database_url(), &config.store_name, config.db_version)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
        }
    }

    async fn pool(&self) -> Option<Pool<Sqlite>> {
        self.pool.read().await.clone()
    }

    async fn connect(&self) -> Result<Pool<Sqlite>, AppError> {
        let in_memory = self.database_url.contains(":memory:");
        if !in_memory {
            if let Some(parent) = database_file(&self.database_url)
                .as_deref()
                .map(Path::new)
                .and_then(Path::parent)
            {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::StorageUnavailable(format!(
                            "Failed to create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        // インメモリ DB は接続ごとに別物になるので 1 本に固定する
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        options
            .connect(&self.database_url)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))
    }

    async fn migrate(&self, pool: &Pool<Sqlite>) -> Result<(), AppError> {
        let current = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(pool)
            .await?;
        let target = i64::from(self.schema_version);

        if current > target {
            return Err(AppError::StorageUnavailable(format!(
                "Stored schema version {current} is newer than {target}"
            )));
        }
        if current == target {
            return Ok(());
        }

        info!(from = current, to = target, store = %self.store_name, "Upgrading offline store schema");

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                verb TEXT NOT NULL,
                data TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            table = self.store_name
        ))
        .execute(pool)
        .await?;

        sqlx::query(&format!(
            r#"CREATE INDEX IF NOT EXISTS "idx_{table}_timestamp" ON "{table}" (timestamp)"#,
            table = self.store_name
        ))
        .execute(pool)
        .await?;

        // PRAGMA はバインド変数を受け付けない
        sqlx::query(&format!("PRAGMA user_version = {target}"))
            .execute(pool)
            .await?;

        Ok(())
    }

    fn insert_sql(&self) -> String {
        format!(
            r#"INSERT INTO "{}" (kind, verb, data, timestamp) VALUES (?1, ?2, ?3, ?4)"#,
            self.store_name
        )
    }
}

#[async_trait]
impl OfflineActionStore for SqliteOfflineActionStore {
    async fn initialize(&self) -> Result<(), AppError> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let pool = self.connect().await?;
        if let Err(e) = self.migrate(&pool).await {
            pool.close().await;
            return Err(e);
        }

        info!(url = %self.database_url, store = %self.store_name, "Offline store opened");
        *guard = Some(pool);
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn append(&self, record: NewOfflineRecord) -> Result<StoredOfflineAction, AppError> {
        let Some(pool) = self.pool().await else {
            return Err(AppError::StorageUnavailable(
                "Offline store is not initialized".to_string(),
            ));
        };

        let action = record.into_action(Utc::now());
        let [kind, verb, data, timestamp] = encode_action(&action)?;

        let result = sqlx::query(&self.insert_sql())
            .bind(&kind)
            .bind(&verb)
            .bind(&data)
            .bind(&timestamp)
            .execute(&pool)
            .await?;

        let id = result.last_insert_rowid();
        debug!(id, action = %action.label(), "Offline action stored");
        Ok(StoredOfflineAction { id, action })
    }

    async fn read_all(&self) -> Result<Vec<StoredOfflineAction>, AppError> {
        let Some(pool) = self.pool().await else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, OfflineActionRow>(&format!(
            r#"SELECT id, kind, verb, data, timestamp FROM "{}" ORDER BY id ASC"#,
            self.store_name
        ))
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(OfflineActionRow::into_stored).collect()
    }

    async fn clear(&self) -> bool {
        let Some(pool) = self.pool().await else {
            return false;
        };

        match sqlx::query(&format!(r#"DELETE FROM "{}""#, self.store_name))
            .execute(&pool)
            .await
        {
            Ok(result) => {
                debug!(deleted = result.rows_affected(), "Offline store cleared");
                true
            }
            Err(e) => {
                warn!("Failed to clear offline store: {}", e);
                false
            }
        }
    }

    async fn replace_all(&self, actions: &[OfflineAction]) -> bool {
        let Some(pool) = self.pool().await else {
            return false;
        };

        let result: Result<(), AppError> = async {
            let mut tx = pool.begin().await?;
            sqlx::query(&format!(r#"DELETE FROM "{}""#, self.store_name))
                .execute(&mut *tx)
                .await?;
            let insert = self.insert_sql();
            for action in actions {
                let [kind, verb, data, timestamp] = encode_action(action)?;
                sqlx::query(&insert)
                    .bind(&kind)
                    .bind(&verb)
                    .bind(&data)
                    .bind(&timestamp)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to rewrite offline store: {}", e);
                false
            }
        }
    }
}

/// `sqlite://path/to.db?mode=rwc` からファイルパス部分を取り出す
fn database_file(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
