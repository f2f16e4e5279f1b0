pub mod cache_name;
pub mod request_class;

pub use cache_name::{CacheName, CacheSet};
pub use request_class::{CacheStrategy, RequestClass};
