pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::services::{
    CacheRouter, ConnectivityEvent, ConnectivityObserver, ConnectivitySignal, FetchDisposition,
    OfflineActionQueue, RequestClassifier, ResponseSource, RouterSettings, WorkerEvent,
    WorkerOutcome,
};
pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

/// `RUST_LOG` が無ければ `printpoka_offline=debug,info` で出力する
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printpoka_offline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
