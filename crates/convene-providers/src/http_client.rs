use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use convene_core::AccessError;

/// Authentication strategy applied to outgoing HTTP requests.
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    None,
    Basic { username: String, password: String },
    BearerToken(String),
}

impl HttpAuth {
    pub fn apply(&self, headers: &mut BTreeMap<String, String>) {
        match self {
            Self::None => {}
            Self::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                headers.insert(String::from("authorization"), format!("Basic {encoded}"));
            }
            Self::BearerToken(token) => {
                headers.insert(String::from("authorization"), format!("Bearer {token}"));
            }
        }
    }
}

// Credentials stay out of debug output.
impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
        }
    }
}

/// GET request issued against a provider API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout_ms: 30_000,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: &HttpAuth) -> Self {
        auth.apply(&mut self.headers);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: String::from("OK"),
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport contract for provider calls.
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// status. Only failures that produced no response become an [`AccessError`],
/// classified as timeout or connect where the transport can tell.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, AccessError>> + Send + 'a>>;
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("convene/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, AccessError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms));

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(transport_error)?;

            let status = response.status();
            let reason = status.canonical_reason().unwrap_or_default().to_owned();
            let body = response
                .text()
                .await
                .map_err(|error| body_read_error(status.as_u16(), &reason, error))?;

            Ok(HttpResponse {
                status: status.as_u16(),
                reason,
                body,
            })
        })
    }
}

fn transport_error(error: reqwest::Error) -> AccessError {
    if error.is_timeout() {
        AccessError::timeout(error.to_string())
    } else if error.is_connect() || error.is_body() || error.is_request() {
        AccessError::connect(error.to_string())
    } else {
        AccessError::other(format!("request failed: {error}"))
    }
}

/// A status line already arrived, so this is never a transport failure. An
/// error status keeps its status with an empty body.
fn body_read_error(status: u16, reason: &str, error: impl std::fmt::Display) -> AccessError {
    if (200..300).contains(&status) {
        AccessError::other(format!("failed to read {status} response body: {error}"))
    } else {
        AccessError::http(status, reason, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_uses_empty_username() {
        let request =
            HttpRequest::get("https://api.affinity.co/persons").with_auth(&HttpAuth::Basic {
                username: String::new(),
                password: String::from("secret"),
            });

        // base64(":secret")
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Basic OnNlY3JldA==")
        );
    }

    #[test]
    fn bearer_auth_populates_authorization_header() {
        let request = HttpRequest::get("https://api.harmonic.ai/companies")
            .with_auth(&HttpAuth::BearerToken(String::from("token-123")));

        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer token-123")
        );
    }

    #[test]
    fn debug_output_hides_credentials() {
        let auth = HttpAuth::BearerToken(String::from("token-123"));
        assert!(!format!("{auth:?}").contains("token-123"));
    }

    #[test]
    fn query_pairs_keep_insertion_order() {
        let request = HttpRequest::get("https://api.harmonic.ai/companies")
            .with_query("limit", "10")
            .with_query_pairs([("offset", "20")]);

        assert_eq!(
            request.query,
            vec![
                (String::from("limit"), String::from("10")),
                (String::from("offset"), String::from("20")),
            ]
        );
    }

    #[test]
    fn unreadable_body_keeps_the_status_instead_of_reporting_transport() {
        let failed = body_read_error(503, "Service Unavailable", "connection reset");
        assert_eq!(failed, AccessError::http(503, "Service Unavailable", ""));
        assert!(!failed.is_transport());

        let succeeded = body_read_error(200, "OK", "connection reset");
        assert!(matches!(succeeded, AccessError::Other { .. }));
        assert!(!succeeded.is_transport());
    }
}
