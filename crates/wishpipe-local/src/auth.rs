//! Bearer-token validation against the deployment's identity provider.
//!
//! Deployments that front the scrape API with auth configure a userinfo
//! endpoint; the token is forwarded as a bearer credential and any non-2xx
//! answer (or a response without a subject) rejects it. Without a configured
//! endpoint the API serves unauthenticated.

use serde::Deserialize;
use std::time::Duration;
use wishpipe_core::{Error, Result, TokenValidator};

fn auth_endpoint_from_env() -> Option<String> {
    std::env::var("WISHPIPE_AUTH_ENDPOINT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct UserinfoValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl UserinfoValidator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Unauthorized(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// `None` when no endpoint is configured (empty values count as unset).
    pub fn from_env() -> Result<Option<Self>> {
        match auth_endpoint_from_env() {
            Some(endpoint) => Ok(Some(Self::new(endpoint)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    sub: Option<String>,
    id: Option<String>,
    user_id: Option<String>,
}

impl UserinfoResponse {
    fn subject(self) -> Option<String> {
        self.sub.or(self.id).or(self.user_id)
    }
}

#[async_trait::async_trait]
impl TokenValidator for UserinfoValidator {
    async fn validate(&self, token: &str) -> Result<String> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Unauthorized("empty bearer token".to_string()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| Error::Unauthorized(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Unauthorized(format!(
                "identity provider returned HTTP {status}"
            )));
        }

        let parsed: UserinfoResponse = resp
            .json()
            .await
            .map_err(|e| Error::Unauthorized(e.to_string()))?;
        parsed
            .subject()
            .ok_or_else(|| Error::Unauthorized("userinfo response had no subject".to_string()))
    }
}
