use std::sync::Arc;

use convene_core::{
    map_filters, AccessError, FilterSet, PagingRequest, ProviderId, ValidationError,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};

/// Authenticated GET access to one provider's REST API.
#[derive(Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    http_client: Arc<dyn HttpClient>,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn with_reqwest(config: ProviderConfig) -> Self {
        Self::new(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub const fn provider(&self) -> ProviderId {
        self.config.provider()
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// GETs `path` (relative to the base URL, leading `/` included) and decodes
    /// the JSON body.
    ///
    /// Transport failures and retryable statuses are retried per the
    /// configured [`RetryConfig`](crate::RetryConfig); the last failure is returned.
    pub async fn get<K, V>(&self, path: &str, query: &[(K, V)]) -> Result<Value, AccessError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = HttpRequest::get(self.url(path))
            .with_query_pairs(
                query
                    .iter()
                    .map(|(name, value)| (name.as_ref(), value.as_ref())),
            )
            .with_header("accept", "application/json")
            .with_auth(&self.config.auth())
            .with_timeout_ms(self.config.timeout_ms());

        let retry = self.config.retry();
        let mut attempt = 0_u32;
        loop {
            debug!(provider = %self.provider(), path, attempt, "provider request");
            let error = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => return decode_body(&response),
                Ok(response) => AccessError::http(response.status, response.reason, response.body),
                Err(error) => error,
            };

            if attempt >= retry.max_retries || !retry.should_retry(&error) {
                return Err(error);
            }

            let delay = retry.delay_for_attempt(attempt);
            warn!(
                provider = %self.provider(),
                path,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying provider request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Fetches one page of a collection endpoint.
    ///
    /// Filters use canonical keys and are mapped to provider field names.
    /// `paging` must be in the convention this provider speaks.
    pub async fn list(
        &self,
        path: &str,
        paging: &PagingRequest,
        filters: &FilterSet,
    ) -> Result<Value, AccessError> {
        let expected = self.provider().page_convention();
        if paging.convention() != expected {
            return Err(ValidationError::PagingConventionMismatch {
                provider: self.provider().to_string(),
                expected: expected.as_str(),
            }
            .into());
        }

        let mut query = map_filters(filters).query_pairs();
        query.extend(
            paging
                .query_pairs()
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value)),
        );
        self.get(path, &query).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url(), path.trim_start_matches('/'))
    }
}

fn decode_body(response: &HttpResponse) -> Result<Value, AccessError> {
    serde_json::from_str(&response.body).map_err(|error| {
        AccessError::decode(format!("status {} body is not JSON: {error}", response.status))
    })
}
