//! Shared reqwest plumbing: base URL, bearer token, timeout, status mapping.

use crate::domain::{ConflictReport, DomainError, WriteConflictPayload};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Error code the record store puts on a write refused for overlapping lessons.
pub const CONFLICT_ERROR_CODE: &str = "CONFLICT_ERROR";

/// Error body of a failed store call. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, alias = "error")]
    message: Option<String>,
    #[serde(default)]
    conflicts: Option<WriteConflictPayload>,
}

/// List responses come either bare (`[...]`) or wrapped (`{"data": [...]}`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(v) => v,
            Listing::Wrapped { data } => data,
        }
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Store(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request against `base_url/path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, &self.url(path))
    }

    /// Request against a full URL, with the same auth.
    pub fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        let rb = self.client.request(method, url);
        match &self.token {
            Some(t) => rb.bearer_auth(t),
            None => rb,
        }
    }

    /// Send and decode a JSON body. Non-2xx responses become domain errors.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        rb: RequestBuilder,
        what: &str,
    ) -> Result<T, DomainError> {
        let res = self.send(rb, what).await?;
        res.json::<T>()
            .await
            .map_err(|e| DomainError::Store(format!("{}: bad response body: {}", what, e)))
    }

    /// Send and ignore the body.
    pub async fn send_empty(&self, rb: RequestBuilder, what: &str) -> Result<(), DomainError> {
        self.send(rb, what).await.map(|_| ())
    }

    async fn send(&self, rb: RequestBuilder, what: &str) -> Result<Response, DomainError> {
        let res = rb
            .send()
            .await
            .map_err(|e| DomainError::Store(format!("{}: request failed: {}", what, e)))?;
        let status = res.status();
        debug!(%status, what, "store response");
        if status.is_success() {
            return Ok(res);
        }
        let text = res.text().await.unwrap_or_default();
        Err(error_from_response(status, &text, what))
    }
}

/// Map a failed store response onto the error taxonomy. The 409 conflict payload is
/// kept structured so it renders like a blocking conflict list.
pub fn error_from_response(status: StatusCode, body: &str, what: &str) -> DomainError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let is_conflict_code = parsed.code.as_deref() == Some(CONFLICT_ERROR_CODE);

    if status == StatusCode::CONFLICT || is_conflict_code {
        if let Some(payload) = parsed.conflicts {
            return DomainError::WriteConflict(payload.into_report(parsed.message));
        }
        if is_conflict_code {
            return DomainError::WriteConflict(ConflictReport {
                message: parsed.message,
                items: Vec::new(),
            });
        }
    }
    match status {
        StatusCode::NOT_FOUND => DomainError::NotFound(what.to_string()),
        StatusCode::PRECONDITION_FAILED => DomainError::StaleRecord {
            record_id: what.to_string(),
        },
        _ => {
            let detail = parsed.message.unwrap_or_else(|| body.chars().take(200).collect());
            DomainError::Store(format!("{}: {} {}", what, status, detail))
        }
    }
}
