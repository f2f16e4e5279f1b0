use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 再送後にキューをどう片付けるか。
///
/// `ClearAll` は失敗したアクションも含めて一括で破棄する（既存の挙動）。
/// `RetainFailed` は失敗分だけを残し、次の `online` で再送する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    #[default]
    ClearAll,
    RetainFailed,
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearAll => write!(f, "clear_all"),
            Self::RetainFailed => write!(f, "retain_failed"),
        }
    }
}

impl FromStr for ReplayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "clear_all" => Ok(Self::ClearAll),
            "retain_failed" => Ok(Self::RetainFailed),
            other => Err(format!("Unknown replay policy: {other}")),
        }
    }
}
