//! Conflict Check endpoint over HTTP. Implements ConflictCheckPort.
//!
//! Any transport error or non-2xx status is returned as `DomainError::ConflictCheck`;
//! the resolver turns that into fail-open.

use super::client::RestClient;
use crate::domain::{ConflictCheckRequest, ConflictCheckResponse, DomainError};
use crate::ports::ConflictCheckPort;
use reqwest::Method;
use tracing::debug;

pub struct HttpConflictCheck {
    rest: RestClient,
    url: String,
}

impl HttpConflictCheck {
    pub fn new(rest: RestClient, url: impl Into<String>) -> Self {
        Self {
            rest,
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl ConflictCheckPort for HttpConflictCheck {
    async fn check(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, DomainError> {
        let rb = self.rest.request_url(Method::POST, &self.url).json(request);
        let response: ConflictCheckResponse = self
            .rest
            .send_json(rb, "conflict check")
            .await
            .map_err(|e| DomainError::ConflictCheck(e.to_string()))?;
        debug!(
            has_conflicts = response.has_conflicts,
            count = response.conflicts.len(),
            "conflict check answered"
        );
        Ok(response)
    }
}
