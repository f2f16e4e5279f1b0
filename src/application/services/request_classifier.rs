use crate::domain::entities::{Request, RequestDestination, RequestMode};
use crate::domain::value_objects::RequestClass;
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use url::Url;

/// リクエストを 4 種類に振り分ける。
///
/// 判定順は固定: 宣言されたリソース種別が画像 → フォント CDN / API パターンに一致 →
/// ナビゲーション → それ以外は静的アセット。
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    origin: Url,
    dynamic_hosts: Vec<String>,
    dynamic_path_prefixes: Vec<String>,
}

impl RequestClassifier {
    pub fn new(
        origin: &str,
        dynamic_hosts: Vec<String>,
        dynamic_path_prefixes: Vec<String>,
    ) -> Result<Self, AppError> {
        let origin = Url::parse(origin)?;
        Ok(Self {
            origin,
            dynamic_hosts: dynamic_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            dynamic_path_prefixes,
        })
    }

    pub fn from_config(origin: &str, config: &CacheConfig) -> Result<Self, AppError> {
        Self::new(
            origin,
            config.dynamic_hosts.clone(),
            config.dynamic_path_prefixes.clone(),
        )
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// 相対 URL をオリジン基準の絶対 URL にする。キャッシュのキーはこの形。
    pub fn resolve(&self, url: &str) -> Result<Url, AppError> {
        Ok(self.origin.join(url)?)
    }

    pub fn classify(&self, request: &Request, url: &Url) -> RequestClass {
        if request.destination == RequestDestination::Image {
            return RequestClass::Image;
        }
        if self.is_dynamic(url) {
            return RequestClass::Dynamic;
        }
        if request.mode == RequestMode::Navigate {
            return RequestClass::Navigation;
        }
        RequestClass::Static
    }

    fn is_dynamic(&self, url: &Url) -> bool {
        let host_matches = url.host_str().is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            self.dynamic_hosts
                .iter()
                .any(|pattern| host == *pattern || host.ends_with(&format!(".{pattern}")))
        });
        if host_matches {
            return true;
        }

        let path = url.path();
        self.dynamic_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}
