//! Puppet CA transport client
//!
//! Owns the mutual-TLS HTTP client and runs built requests against the
//! versioned CA API, turning every response into raw body bytes or a
//! [`CaError`]. One attempt per call; nothing is retried or cached.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use tracing::{debug, info, warn};

use crate::config::PuppetCaConfig;
use crate::services::request::CaRequest;
use crate::services::tls;
use crate::utils::error::{CaError, CaResult};

/// Version segment appended to the configured CA URL
pub const API_PATH: &str = "puppet-ca/v1";

/// Puppet CA API client
#[derive(Debug, Clone)]
pub struct CaClient {
    client: Client,
    base_url: String,
}

impl CaClient {
    /// Create a client presenting the configured identity and trusting only
    /// the configured CA bundle
    pub fn new(config: &PuppetCaConfig) -> CaResult<Self> {
        info!("Initializing Puppet CA client for {}", config.url);

        let ssl = &config.ssl;
        let (Some(cert), Some(key)) = (&ssl.cert, &ssl.key) else {
            return Err(CaError::Config(
                "a client certificate and private key are required".to_string(),
            ));
        };
        let ca = ssl
            .ca
            .as_ref()
            .ok_or_else(|| CaError::Config("a CA bundle is required".to_string()))?;

        let identity = tls::load_identity(cert, key)?;
        let roots = tls::load_ca_bundle(ca)?;

        // Only the Puppet CA is trusted, never the system roots
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .use_rustls_tls()
            .tls_built_in_root_certs(false);

        // CA certificates must be added before the identity for rustls
        for cert in roots {
            builder = builder.add_root_certificate(cert);
        }
        builder = builder.identity(identity);

        let client = builder
            .build()
            .map_err(|e| CaError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::from_http_client(&config.url, client))
    }

    /// Wrap an already configured HTTP client
    pub fn from_http_client(url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: format!("{}/{}", url.trim_end_matches('/'), API_PATH),
        }
    }

    /// Versioned API base, e.g. `https://puppet:8140/puppet-ca/v1`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against the API base
    pub fn request(&self) -> CaRequest {
        CaRequest::new(self.base_url.clone())
    }

    /// Perform a GET request
    pub async fn get(&self, request: CaRequest) -> CaResult<Vec<u8>> {
        self.execute(request.build(Method::GET)?).await
    }

    /// Perform a POST request
    pub async fn post(&self, request: CaRequest) -> CaResult<Vec<u8>> {
        self.execute(request.build(Method::POST)?).await
    }

    /// Perform a PUT request
    pub async fn put(&self, request: CaRequest) -> CaResult<Vec<u8>> {
        self.execute(request.build(Method::PUT)?).await
    }

    /// Perform a DELETE request
    pub async fn delete(&self, request: CaRequest) -> CaResult<Vec<u8>> {
        self.execute(request.build(Method::DELETE)?).await
    }

    /// Send a built request and return the body of a 200 or 204 response
    pub async fn execute(&self, request: reqwest::Request) -> CaResult<Vec<u8>> {
        let method = request.method().clone();
        let url = request.url().to_string();
        debug!(%method, %url, "Sending Puppet CA request");

        let response = self.client.execute(request).await.map_err(|source| {
            CaError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            warn!(%method, %url, %status, "Puppet CA returned an error status");
            return Err(CaError::HttpStatus {
                method,
                url,
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CaError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        debug!(%method, %url, %status, bytes = body.len(), "Puppet CA request completed");
        Ok(body.to_vec())
    }
}
