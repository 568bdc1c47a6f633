//! Blocking HTTP helper shared by the remote collaborators.

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use uptodate_common::constants::APP_NAME;
use uptodate_common::error::{Result, UptodateError};

/// Thin wrapper over a blocking `reqwest` client.
///
/// Requests fail fast: there is no retry at this layer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_NAME)
            .build()
            .map_err(|e| UptodateError::Http {
                url: String::new(),
                message: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Fetches `url` as text. Returns `None` for non-success statuses so
    /// callers can treat them as resolution misses.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures.
    pub fn get_text(&self, url: &str, headers: HeaderMap) -> Result<Option<String>> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .map_err(|e| UptodateError::Http {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, %status, "non-success response");
            return Ok(None);
        }

        let body = response.text().map_err(|e| UptodateError::Http {
            url: url.to_string(),
            message: format!("failed to read response body: {e}"),
        })?;
        Ok(Some(body))
    }

    /// Fetches `url` and decodes the body as JSON. Returns `None` for
    /// non-success statuses.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or malformed JSON.
    pub fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Option<T>> {
        match self.get_text(url, headers)? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }
}

/// Builds the header set for the GitHub v3 API.
#[must_use]
pub fn github_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let _ = headers.insert(USER_AGENT, HeaderValue::from_static(APP_NAME));
    let _ = headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github.v3+json"),
    );
    if let Some(token) = token {
        if let Ok(value) = HeaderValue::from_str(&format!("token {token}")) {
            let _ = headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_headers_without_token_has_no_authorization() {
        let headers = github_headers(None);
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(
            headers.get(ACCEPT).map(|v| v.to_str().unwrap()),
            Some("application/vnd.github.v3+json")
        );
    }

    #[test]
    fn github_headers_with_token_sets_authorization() {
        let headers = github_headers(Some("abc"));
        assert_eq!(
            headers.get(AUTHORIZATION).map(|v| v.to_str().unwrap()),
            Some("token abc")
        );
    }
}
