use std::fmt;
use std::time::Duration;

use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ClientError;
use crate::request::{
    DEFAULT_BASE_URL, carries_body, decode_response, endpoint_url, json_body, parse_base_url,
    query_pairs, validate_access_token,
};

/// Generic blocking NPA transport client.
///
/// This is the synchronous counterpart of [`crate::ApiClient`].
pub struct BlockingApiClient {
    base_url: Url,
    access_token: String,
    timeout: Option<Duration>,
    http: reqwest::blocking::Client,
}

impl fmt::Debug for BlockingApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BlockingApiClient {
    /// Creates a client for the public NPA endpoint. No request is sent.
    pub fn new(access_token: impl Into<String>) -> Result<Self, ClientError> {
        let access_token = access_token.into();
        validate_access_token(&access_token)?;

        Ok(Self {
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            access_token,
            timeout: None,
            http: reqwest::blocking::Client::new(),
        })
    }

    /// Returns the client pointed at another NPA root.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        self.base_url = parse_base_url(base_url.as_ref())?;
        Ok(self)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::blocking::Client) -> Self {
        self.http = http;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a `GET` request with `params` in the query string.
    pub fn get_json(&self, endpoint: &str, params: Value) -> Result<Value, ClientError> {
        self.call(Method::GET, endpoint, params)
    }

    /// Sends a `POST` request with `params` in the JSON body.
    pub fn post_json(&self, endpoint: &str, params: Value) -> Result<Value, ClientError> {
        self.call(Method::POST, endpoint, params)
    }

    /// Sends a request to an NPA endpoint and returns the decoded JSON document.
    pub fn call(
        &self,
        method: Method,
        endpoint: &str,
        params: Value,
    ) -> Result<Value, ClientError> {
        let request = self.build_request(method, endpoint, &params)?;
        debug!(method = %request.method(), endpoint, "sending NPA request");

        let result = self.execute(request);
        if let Err(error) = &result {
            warn!(endpoint, %error, "NPA request failed");
        }
        result
    }

    fn execute(&self, request: reqwest::blocking::Request) -> Result<Value, ClientError> {
        let response = self.http.execute(request).map_err(redact)?;
        let status = response.status();
        let payload = response.text().map_err(redact)?;
        decode_response(status, &payload)
    }

    pub(crate) fn build_request(
        &self,
        method: Method,
        endpoint: &str,
        params: &Value,
    ) -> Result<reqwest::blocking::Request, ClientError> {
        let url = endpoint_url(&self.base_url, endpoint)?;
        let with_body = carries_body(&method);
        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        request = if with_body {
            request.json(&json_body(&self.access_token, params)?)
        } else {
            request.query(&query_pairs(&self.access_token, params)?)
        };

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        request.build().map_err(redact)
    }
}

fn redact(error: reqwest::Error) -> ClientError {
    ClientError::Request(error.without_url())
}
