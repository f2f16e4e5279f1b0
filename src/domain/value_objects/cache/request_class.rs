use serde::{Deserialize, Serialize};
use std::fmt;

/// フェッチ要求の分類。判定は Image → Dynamic → Navigation → Static の優先順。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    Image,
    Dynamic,
    Navigation,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    CacheFirst,
    NetworkFirst,
}

impl RequestClass {
    pub fn strategy(&self) -> CacheStrategy {
        match self {
            Self::Image | Self::Static => CacheStrategy::CacheFirst,
            Self::Dynamic | Self::Navigation => CacheStrategy::NetworkFirst,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Dynamic => "dynamic",
            Self::Navigation => "navigation",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
