pub mod request;
pub mod response;

pub use request::{Request, RequestDestination, RequestMethod, RequestMode};
pub use response::{CachedResponse, Response};
