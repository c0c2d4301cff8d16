//! Endpoint and header constants for the modules REST backend

/// Name of the collection holding survey modules
pub const MODULES_COLLECTION: &str = "modules";

/// User agent sent with every request
pub const USER_AGENT: &str = "survey-modules/0.1";

/// Standard headers for backend requests
pub mod headers {
    /// Content type for JSON requests
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Correlation header attached to each request for log matching
    pub const X_CORRELATION_ID: &str = "X-Correlation-ID";
}

/// Build the collection endpoint URL
pub fn collection_endpoint(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), MODULES_COLLECTION)
}

/// Build the endpoint URL of a single module
pub fn module_endpoint(base_url: &str, id: &str) -> String {
    format!("{}/{}", collection_endpoint(base_url), urlencoding::encode(id))
}
