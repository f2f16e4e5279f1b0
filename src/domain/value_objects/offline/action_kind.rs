use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// オフライン中に記録されるアクションの対象（カート・ウィッシュリスト・注文）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfflineActionKind {
    Cart,
    Wishlist,
    Order,
}

impl OfflineActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Order => "order",
        }
    }

    /// バックグラウンド同期に登録するタグ。注文には同期タグが無い。
    pub fn sync_tag(&self) -> Option<&'static str> {
        match self {
            Self::Cart => Some(CART_SYNC_TAG),
            Self::Wishlist => Some(WISHLIST_SYNC_TAG),
            Self::Order => None,
        }
    }
}

pub const CART_SYNC_TAG: &str = "cart-sync";
pub const WISHLIST_SYNC_TAG: &str = "wishlist-sync";

impl fmt::Display for OfflineActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OfflineActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cart" => Ok(Self::Cart),
            "wishlist" => Ok(Self::Wishlist),
            "order" => Ok(Self::Order),
            other => Err(format!("Unknown offline action type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("Cart".parse::<OfflineActionKind>(), Ok(OfflineActionKind::Cart));
        assert_eq!(
            " wishlist ".parse::<OfflineActionKind>(),
            Ok(OfflineActionKind::Wishlist)
        );
        assert!("coupon".parse::<OfflineActionKind>().is_err());
    }

    #[test]
    fn order_has_no_sync_tag() {
        assert_eq!(OfflineActionKind::Cart.sync_tag(), Some("cart-sync"));
        assert_eq!(OfflineActionKind::Wishlist.sync_tag(), Some("wishlist-sync"));
        assert_eq!(OfflineActionKind::Order.sync_tag(), None);
    }
}
