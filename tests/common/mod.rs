pub mod mocks;

use printpoka_offline::application::services::{RequestClassifier, RouterSettings};
use printpoka_offline::shared::config::CacheConfig;

pub const ORIGIN: &str = "https://shop.example";

pub fn absolute(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

#[allow(dead_code)]
pub fn classifier() -> RequestClassifier {
    RequestClassifier::from_config(ORIGIN, &CacheConfig::default()).expect("classifier")
}

#[allow(dead_code)]
pub fn settings() -> RouterSettings {
    RouterSettings::from_config(&CacheConfig::default()).expect("router settings")
}

/// 既定の静的マニフェストすべてに 200 を返すネットワーク
#[allow(dead_code)]
pub fn shell_network() -> mocks::ScriptedNetwork {
    CacheConfig::default()
        .static_manifest
        .iter()
        .fold(mocks::ScriptedNetwork::new(), |network, path| {
            network.route(
                &absolute(path),
                printpoka_offline::domain::entities::Response::ok(format!("shell {path}")),
            )
        })
}
