use crate::domain::value_objects::offline::ReplayPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub network: NetworkConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// `data_dir` と `db_name` から導出するパスを上書きする（例: `sqlite::memory:`）
    #[serde(default)]
    pub database_url: Option<String>,
    pub db_name: String,
    pub db_version: u32,
    pub store_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub prefix: String,
    pub version: String,
    pub legacy_cache_name: String,
    pub static_manifest: Vec<String>,
    pub placeholder_image: String,
    pub offline_page: String,
    pub dynamic_hosts: Vec<String>,
    pub dynamic_path_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub origin: String,
    pub request_timeout_secs: u64,
    pub start_online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub replay_policy: ReplayPolicy,
    /// バックグラウンド同期が使えるホストかどうか
    #[serde(default = "default_true")]
    pub background_sync: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            replay_policy: ReplayPolicy::default(),
            background_sync: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            cache: CacheConfig::default(),
            network: NetworkConfig {
                origin: "http://localhost:8080".to_string(),
                request_timeout_secs: 30,
                start_online: true,
            },
            queue: QueueConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            database_url: None,
            db_name: "PrintPokaOffline".to_string(),
            db_version: 1,
            store_name: "actions".to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "printpoka".to_string(),
            version: "v2".to_string(),
            // 旧ポートフォリオ版のキャッシュ名
            legacy_cache_name: "portfolio-v1".to_string(),
            static_manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/favicon.ico".to_string(),
                "/offline.html".to_string(),
                "/placeholder.svg".to_string(),
            ],
            placeholder_image: "/placeholder.svg".to_string(),
            offline_page: "/offline.html".to_string(),
            dynamic_hosts: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            dynamic_path_prefixes: vec!["/api/".to_string()],
        }
    }
}

impl StorageConfig {
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite://{}/{}.db?mode=rwc",
                self.data_dir.trim_end_matches('/'),
                self.db_name
            ),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PRINTPOKA_DATA_DIR") {
            if !v.trim().is_empty() {
                cfg.storage.data_dir = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("PRINTPOKA_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.storage.database_url = Some(v.trim().to_string());
            }
        }
        if let Ok(v) = std::env::var("PRINTPOKA_DB_NAME") {
            if !v.trim().is_empty() {
                cfg.storage.db_name = v.trim().to_string();
            }
        }
        if let Some(value) = std::env::var("PRINTPOKA_DB_VERSION")
            .ok()
            .and_then(|v| parse_u64(&v))
        {
            cfg.storage.db_version = value.clamp(1, u32::MAX as u64) as u32;
        }
        if let Ok(v) = std::env::var("PRINTPOKA_STORE_NAME") {
            if !v.trim().is_empty() {
                cfg.storage.store_name = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("PRINTPOKA_CACHE_VERSION") {
            if !v.trim().is_empty() {
                cfg.cache.version = v.trim().to_string();
            }
        }

        if let Ok(v) = std::env::var("PRINTPOKA_ORIGIN") {
            if !v.trim().is_empty() {
                cfg.network.origin = v.trim().to_string();
            }
        }
        if let Some(value) = std::env::var("PRINTPOKA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| parse_u64(&v))
        {
            cfg.network.request_timeout_secs = value.max(1);
        }
        if let Ok(v) = std::env::var("PRINTPOKA_START_ONLINE") {
            cfg.network.start_online = parse_bool(&v, cfg.network.start_online);
        }

        if let Ok(v) = std::env::var("PRINTPOKA_REPLAY_POLICY") {
            match v.parse::<ReplayPolicy>() {
                Ok(policy) => cfg.queue.replay_policy = policy,
                Err(e) => tracing::warn!("Ignoring PRINTPOKA_REPLAY_POLICY: {}", e),
            }
        }
        if let Ok(v) = std::env::var("PRINTPOKA_BACKGROUND_SYNC") {
            cfg.queue.background_sync = parse_bool(&v, cfg.queue.background_sync);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.storage.db_name.trim().is_empty() {
            return Err("Storage db_name must not be empty".to_string());
        }
        if self.storage.db_version == 0 {
            return Err("Storage db_version must be greater than 0".to_string());
        }
        if !is_identifier(&self.storage.store_name) {
            return Err(format!(
                "Storage store_name must be an identifier: {}",
                self.storage.store_name
            ));
        }
        if self.cache.version.trim().is_empty() {
            return Err("Cache version must not be empty".to_string());
        }
        if self.cache.static_manifest.is_empty() {
            return Err("Cache static_manifest must list at least one URL".to_string());
        }
        if url::Url::parse(&self.network.origin).is_err() {
            return Err(format!("Network origin is not a URL: {}", self.network.origin));
        }
        if self.network.request_timeout_secs == 0 {
            return Err("Network request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
