use crate::application::ports::NetworkFetcher;
use crate::domain::entities::{Request, RequestMethod, Response};
use crate::shared::config::NetworkConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// reqwest でオリジンへ実際に取りに行く `NetworkFetcher`
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            origin: Url::parse(origin)?,
        })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self, AppError> {
        Self::new(
            &config.origin,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn target(&self, request: &Request) -> Result<Url, AppError> {
        Ok(self.origin.join(&request.url)?)
    }
}

#[async_trait]
impl NetworkFetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, AppError> {
        let url = self.target(request)?;
        debug!(method = %request.method, url = %url, "HTTP fetch");

        let reply = self
            .client
            .request(to_reqwest_method(request.method), url)
            .send()
            .await?;

        let status = reply.status();
        let headers = reply
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = reply.bytes().await?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn to_reqwest_method(method: RequestMethod) -> reqwest::Method {
    match method {
        RequestMethod::Get => reqwest::Method::GET,
        RequestMethod::Head => reqwest::Method::HEAD,
        RequestMethod::Post => reqwest::Method::POST,
        RequestMethod::Put => reqwest::Method::PUT,
        RequestMethod::Patch => reqwest::Method::PATCH,
        RequestMethod::Delete => reqwest::Method::DELETE,
        RequestMethod::Options => reqwest::Method::OPTIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_requests_target_the_origin() {
        let fetcher = HttpFetcher::new("http://localhost:8080", Duration::from_secs(1)).unwrap();
        let url = fetcher.target(&Request::get("/offline.html")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/offline.html");

        let url = fetcher
            .target(&Request::get("https://fonts.gstatic.com/s/inter.woff2"))
            .unwrap();
        assert_eq!(url.host_str(), Some("fonts.gstatic.com"));
    }

    #[test]
    fn methods_map_one_to_one() {
        assert_eq!(to_reqwest_method(RequestMethod::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(RequestMethod::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // ポート 9 (discard) は通常閉じている
        let fetcher = HttpFetcher::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch(&Request::get("/")).await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }
}
