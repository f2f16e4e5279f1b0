use crate::shared::config::CacheConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// バージョン付きのキャッシュ名（例: `printpoka-static-v2`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheName(String);

impl CacheName {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Cache name cannot be empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CacheName> for String {
    fn from(name: CacheName) -> Self {
        name.0
    }
}

/// 現行バージョンで有効なキャッシュ名の集合。
/// アクティベーション時、ここに含まれない名前はすべて削除される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSet {
    pub static_cache: CacheName,
    pub dynamic_cache: CacheName,
    pub image_cache: CacheName,
    pub legacy_cache: CacheName,
}

impl CacheSet {
    pub fn new(
        static_cache: CacheName,
        dynamic_cache: CacheName,
        image_cache: CacheName,
        legacy_cache: CacheName,
    ) -> Self {
        Self {
            static_cache,
            dynamic_cache,
            image_cache,
            legacy_cache,
        }
    }

    pub fn versioned(prefix: &str, version: &str, legacy: &str) -> Result<Self, String> {
        Ok(Self::new(
            CacheName::new(format!("{prefix}-static-{version}"))?,
            CacheName::new(format!("{prefix}-dynamic-{version}"))?,
            CacheName::new(format!("{prefix}-images-{version}"))?,
            CacheName::new(legacy.to_string())?,
        ))
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, String> {
        Self::versioned(&config.prefix, &config.version, &config.legacy_cache_name)
    }

    pub fn known_good(&self) -> [&CacheName; 4] {
        [
            &self.static_cache,
            &self.dynamic_cache,
            &self.image_cache,
            &self.legacy_cache,
        ]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.known_good().iter().any(|known| known.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_names_follow_prefix_and_version() {
        let set = CacheSet::versioned("printpoka", "v3", "portfolio-v1").unwrap();
        assert_eq!(set.static_cache.as_str(), "printpoka-static-v3");
        assert_eq!(set.dynamic_cache.as_str(), "printpoka-dynamic-v3");
        assert_eq!(set.image_cache.as_str(), "printpoka-images-v3");
        assert!(set.contains("portfolio-v1"));
        assert!(!set.contains("printpoka-static-v2"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(CacheName::new("  ".into()).is_err());
        assert!(CacheSet::versioned("printpoka", "v1", "").is_err());
    }
}
