pub mod logging_executor;

pub use logging_executor::LoggingActionExecutor;
