use serde::{Deserialize, Serialize};
use serde_json::Value;

/// アクション種別ごとに形が変わる不透明なペイロード。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OfflinePayload(Value);

impl OfflinePayload {
    pub fn new(value: Value) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| format!("Invalid JSON payload: {e}"))?;
        Self::new(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// `productId` を文字列・数値どちらの形でも取り出す
    pub fn product_id(&self) -> Option<String> {
        match self.0.get("productId")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn validate(value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Err("Offline payload cannot be null".to_string());
        }
        Ok(())
    }
}

impl From<OfflinePayload> for Value {
    fn from(payload: OfflinePayload) -> Self {
        payload.0
    }
}
