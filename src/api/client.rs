use super::constants::{self, headers};
use super::error::{ApiError, ApiResult};
use super::models::{Module, ModuleDraft};
use super::resilience::{ApiLogger, OperationContext, RetryConfig, RetryPolicy};
use super::store::ModuleStore;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// HTTP client for the `/modules` collection with connection pooling
#[derive(Clone)]
pub struct ModulesClient {
    base_url: String,
    http_client: reqwest::Client,
    retry_policy: RetryPolicy, // Applied to idempotent calls only
    api_logger: ApiLogger,
}

impl ModulesClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_settings(base_url, Duration::from_secs(30), RetryConfig::default())
    }

    /// Create a client with an explicit request timeout and retry budget
    pub fn with_settings(
        base_url: impl Into<String>,
        timeout: Duration,
        retry_config: RetryConfig,
    ) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(constants::USER_AGENT)
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
            retry_policy: RetryPolicy::new(retry_config),
            api_logger: ApiLogger::default(),
        })
    }

    /// Create a client around an existing HTTP client
    pub fn with_custom_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
            retry_policy: RetryPolicy::default(),
            api_logger: ApiLogger::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and require a success status, with retries when
    /// `retry` is set. `id` names the addressed module so a 404 maps to
    /// `NotFound`.
    async fn send<F, Fut>(
        &self,
        context: &OperationContext,
        method: &str,
        url: &str,
        id: Option<&str>,
        retry: bool,
        request: F,
    ) -> ApiResult<reqwest::Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let request = &request;
        let attempt = move || async move {
            self.api_logger.log_request(context, method, url);
            let response = request().await?;
            self.api_logger.log_response(context, response.status().as_u16());
            ensure_success(response, id).await
        };

        if retry {
            self.retry_policy.execute(attempt).await
        } else {
            attempt().await
        }
    }

    fn finish<T>(&self, context: &OperationContext, result: ApiResult<T>) -> ApiResult<T> {
        let message = result.as_ref().err().map(|e| e.to_string());
        self.api_logger.complete_operation(context, message.as_deref());
        result
    }
}

/// Turn non-success responses into typed failures
///
/// A 404 becomes `NotFound` only when the request addressed a single module.
async fn ensure_success(response: reqwest::Response, id: Option<&str>) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ApiError::NotFound { id: id.to_string() });
        }
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let text = response.text().await?;
    debug!("Decoding response body ({} bytes)", text.len());
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl ModuleStore for ModulesClient {
    async fn list(&self) -> ApiResult<Vec<Module>> {
        let url = constants::collection_endpoint(&self.base_url);
        let context = self.api_logger.start_operation("list", None);

        let result = async {
            let response = self
                .send(&context, "GET", &url, None, true, || {
                    self.http_client
                        .get(&url)
                        .header("Accept", headers::CONTENT_TYPE_JSON)
                        .header(headers::X_CORRELATION_ID, &context.correlation_id)
                        .send()
                })
                .await?;
            decode(response).await
        }
        .await;

        self.finish(&context, result)
    }

    async fn get(&self, id: &str) -> ApiResult<Module> {
        let url = constants::module_endpoint(&self.base_url, id);
        let context = self.api_logger.start_operation("get", Some(id));

        let result = async {
            let response = self
                .send(&context, "GET", &url, Some(id), true, || {
                    self.http_client
                        .get(&url)
                        .header("Accept", headers::CONTENT_TYPE_JSON)
                        .header(headers::X_CORRELATION_ID, &context.correlation_id)
                        .send()
                })
                .await?;
            decode(response).await
        }
        .await;

        self.finish(&context, result)
    }

    async fn create(&self, draft: &ModuleDraft) -> ApiResult<Module> {
        let url = constants::collection_endpoint(&self.base_url);
        let context = self.api_logger.start_operation("create", None);

        // Backends that do not stamp records still get usable timestamps
        let now = Utc::now();
        let payload = draft.clone().into_module(None, Some(now), Some(now));

        let result = async {
            let response = self
                .send(&context, "POST", &url, None, false, || {
                    self.http_client
                        .post(&url)
                        .header("Content-Type", headers::CONTENT_TYPE_JSON)
                        .header(headers::X_CORRELATION_ID, &context.correlation_id)
                        .json(&payload)
                        .send()
                })
                .await?;
            decode(response).await
        }
        .await;

        self.finish(&context, result)
    }

    async fn update_existing(&self, id: &str, draft: &ModuleDraft) -> ApiResult<Module> {
        let url = constants::module_endpoint(&self.base_url, id);
        let context = self.api_logger.start_operation("update", Some(id));
        // PUT replaces the whole record, so the creation time goes along
        let payload = draft
            .clone()
            .into_module(Some(id.to_string()), draft.created_at, Some(Utc::now()));

        let result = async {
            let response = self
                .send(&context, "PUT", &url, Some(id), true, || {
                    self.http_client
                        .put(&url)
                        .header("Content-Type", headers::CONTENT_TYPE_JSON)
                        .header(headers::X_CORRELATION_ID, &context.correlation_id)
                        .json(&payload)
                        .send()
                })
                .await?;
            decode(response).await
        }
        .await;

        self.finish(&context, result)
    }

    async fn remove(&self, id: &str) -> ApiResult<()> {
        let url = constants::module_endpoint(&self.base_url, id);
        let context = self.api_logger.start_operation("remove", Some(id));

        let result = async {
            self.send(&context, "DELETE", &url, Some(id), true, || {
                self.http_client
                    .delete(&url)
                    .header(headers::X_CORRELATION_ID, &context.correlation_id)
                    .send()
            })
            .await
            .map(|_| ())
        }
        .await;

        self.finish(&context, result)
    }
}
