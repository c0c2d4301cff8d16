//! Retry and structured request logging for backend calls

pub mod logging;
pub mod retry;

pub use logging::{ApiLogger, OperationContext};
pub use retry::{RetryConfig, RetryPolicy, is_transient};
