//! Request builder for the Puppet CA API
//!
//! A [`CaRequest`] accumulates the path, headers, query parameters and body of
//! one call and turns them into a [`reqwest::Request`] for a given method.

use std::collections::{BTreeMap, HashMap};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::utils::error::CaError;

/// Percent-encode a certificate name for use as a single path segment
pub fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Builder for a single CA request
#[derive(Debug, Clone)]
pub struct CaRequest {
    base_url: String,
    path: String,
    headers: HashMap<String, String>,
    query: BTreeMap<String, Vec<String>>,
    body: Option<Vec<u8>>,
}

impl CaRequest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: String::new(),
            headers: HashMap::new(),
            query: BTreeMap::new(),
            body: None,
        }
    }

    /// Set the path below the base URL, e.g. `format!("certificate/{}", segment(name))`
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add a header, replacing any previous value for the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        self
    }

    /// Add a query parameter; empty values mean "not specified" and are dropped
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.query.entry(key.into()).or_default().push(value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, CaError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| CaError::Build(format!("Failed to serialize JSON body: {}", e)))?;
        Ok(self.body(body).header(CONTENT_TYPE.as_str(), "application/json"))
    }

    /// Full URL including the encoded query string
    pub fn url(&self) -> Result<Url, CaError> {
        let uri = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&uri)
            .map_err(|e| CaError::Build(format!("Invalid URL {}: {}", uri, e)))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, values) in &self.query {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }

        Ok(url)
    }

    /// Produce a transport-ready request; the builder is left untouched
    pub fn build(&self, method: Method) -> Result<reqwest::Request, CaError> {
        let url = self.url()?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CaError::Build(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| CaError::Build(format!("Invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut request = reqwest::Request::new(method, url);
        *request.headers_mut() = headers;
        if let Some(ref body) = self.body {
            *request.body_mut() = Some(body.clone().into());
        }

        Ok(request)
    }
}
