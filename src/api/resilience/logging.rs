//! Structured logging with correlation tracking for module API calls
//!
//! Each backend call gets an [`OperationContext`] whose correlation id is also
//! sent as a request header, so log lines can be matched with server logs.

use log::{debug, error, info, warn};
use serde_json::json;
use std::time::{Duration, Instant};

/// Structured logger for backend operations
#[derive(Debug, Clone)]
pub struct ApiLogger {
    request_logging: bool,
}

impl Default for ApiLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Context for a single backend call
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub correlation_id: String,
    /// list, get, create, update or remove
    pub operation_type: String,
    /// Module id the call targets, if any
    pub target: Option<String>,
    pub start_time: Instant,
}

impl OperationContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl ApiLogger {
    pub fn new(request_logging: bool) -> Self {
        Self { request_logging }
    }

    /// Start tracking a new operation with a fresh correlation id
    pub fn start_operation(&self, operation_type: &str, target: Option<&str>) -> OperationContext {
        let context = OperationContext {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            operation_type: operation_type.to_string(),
            target: target.map(str::to_string),
            start_time: Instant::now(),
        };

        if self.request_logging {
            let log_data = json!({
                "event": "call_started",
                "correlation_id": context.correlation_id,
                "operation_type": context.operation_type,
                "target": context.target,
                "started_at": chrono::Utc::now().to_rfc3339()
            });
            debug!("Module call started: {}", log_data);
        }

        context
    }

    pub fn log_request(&self, context: &OperationContext, method: &str, url: &str) {
        if !self.request_logging {
            return;
        }

        let log_data = json!({
            "event": "request_sent",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "method": method,
            "url": url,
        });
        debug!("-> {}", log_data);
    }

    pub fn log_response(&self, context: &OperationContext, status_code: u16) {
        if !self.request_logging {
            return;
        }

        let log_data = json!({
            "event": "response_received",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "status_code": status_code,
            "duration_ms": context.elapsed().as_millis(),
        });

        // A 404 is routine: updates of vanished modules fall back to create
        match status_code {
            500.. => warn!("<- server error {}", log_data),
            400..=499 => info!("<- client error {}", log_data),
            _ => debug!("<- {}", log_data),
        }
    }

    /// Log the outcome of an operation
    pub fn complete_operation(&self, context: &OperationContext, error_message: Option<&str>) {
        let log_data = json!({
            "event": "call_finished",
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "target": context.target,
            "duration_ms": context.elapsed().as_millis(),
            "ok": error_message.is_none(),
            "error": error_message,
        });

        match error_message {
            None => info!("Module call finished: {}", log_data),
            Some(_) => error!("Module call failed: {}", log_data),
        }
    }
}
