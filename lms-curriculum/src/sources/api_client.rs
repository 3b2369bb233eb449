//! LMS API client
//!
//! Thin reqwest wrapper shared by every source adapter. Adds the auth token
//! (as `Authorization: Bearer` and `x-access-token`) when one is configured,
//! and turns non-2xx responses into [`SourceError::Status`].

use lms_common::config::ApiConfig;
use reqwest::{header, Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::types::SourceError;

/// Default timeout for LMS API requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header
const USER_AGENT: &str = concat!("lms-curriculum/", env!("CARGO_PKG_VERSION"));

/// Header some LMS deployments read instead of `Authorization`
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, SourceError> {
        Self::new(&config.base_url, config.resolve_token(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// `{base}/{segments...}?{query}`; segments are percent-encoded
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a JSON document
    pub async fn get_json(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Value, SourceError> {
        let url = self.url(segments, query)?;
        debug!(url = %url, "LMS API request");

        let mut request = self.http_client.get(url.clone());
        if let Some(token) = &self.token {
            request = request
                .bearer_auth(token)
                .header(ACCESS_TOKEN_HEADER, token.as_str());
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "LMS API returned error status");
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse response from {}: {}", url, e)))?;

        Ok(body)
    }
}

/// Follow a key path into a JSON document, skipping nulls
pub fn json_path<'a>(body: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(body, |value, key| value.get(*key))
        .filter(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, None, DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_url_joins_segments_onto_base_path() {
        let c = client("http://localhost:5000/api");
        let url = c.url(&["courses", "abc", "curriculum"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/courses/abc/curriculum");

        let c = client("http://localhost:5000/api/");
        let url = c.url(&["courses", "abc"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/courses/abc");
    }

    #[test]
    fn test_url_encodes_segments_and_query() {
        let c = client("http://localhost:5000/api");
        let url = c
            .url(&["courses", "a b/c"], &[("student_id", "s 1".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/courses/a%20b%2Fc?student_id=s+1"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", None, DEFAULT_TIMEOUT),
            Err(SourceError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:someone@example.com", None, DEFAULT_TIMEOUT),
            Err(SourceError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let c = ApiClient::new("http://localhost/api", Some("  ".into()), DEFAULT_TIMEOUT).unwrap();
        assert!(!c.has_token());
    }

    #[test]
    fn test_json_path() {
        let body = json!({ "data": { "curriculum": [1], "empty": null } });
        assert_eq!(json_path(&body, &["data", "curriculum"]), Some(&json!([1])));
        assert_eq!(json_path(&body, &["data", "empty"]), None);
        assert_eq!(json_path(&body, &["data", "missing"]), None);
    }
}
