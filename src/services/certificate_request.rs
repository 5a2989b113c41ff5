//! Certificate signing request operations
//!
//! Submitting, downloading and withdrawing CSRs, plus single and bulk
//! signing. Signing a single request goes through `certificate_status`.

use tracing::{debug, info, warn};

use crate::models::{BulkSignResult, CertNames, Certificate, CertificateSave, CertificateState};
use crate::services::certificate::{pem_text, validate_names};
use crate::services::client::CaClient;
use crate::services::request::segment;
use crate::utils::error::{CaError, CaResult};

impl CaClient {
    /// Upload a PEM encoded CSR for `name`
    pub async fn submit_certificate_request(&self, name: &str, csr_pem: &str) -> CaResult<()> {
        let req = self
            .request()
            .path(format!("certificate_request/{}", segment(name)))
            .header("Content-Type", "text/plain")
            .body(csr_pem);

        self.put(req).await?;
        info!(certname = name, "Certificate request submitted");
        Ok(())
    }

    /// Download a pending CSR as PEM text
    pub async fn download_certificate_request(&self, name: &str) -> CaResult<String> {
        let pem = self
            .get(self.request().path(format!("certificate_request/{}", segment(name))))
            .await?;

        pem_text(pem, name)
    }

    /// Delete a pending CSR
    pub async fn withdraw_certificate_request(&self, name: &str) -> CaResult<()> {
        self.delete(self.request().path(format!("certificate_request/{}", segment(name))))
            .await?;

        info!(certname = name, "Certificate request withdrawn");
        Ok(())
    }

    pub async fn list_certificate_requests(&self) -> CaResult<Vec<Certificate>> {
        self.list_certificates(Some(CertificateState::Requested)).await
    }

    /// Sign the pending CSR for `name`
    ///
    /// A TTL of zero is the same as none: the CA default applies.
    pub async fn sign_certificate_request(&self, name: &str, ttl: Option<u64>) -> CaResult<()> {
        self.save_certificate(name, &CertificateSave::signed(ttl)).await
    }

    /// Sign the named pending CSRs in one request
    pub async fn bulk_sign(&self, names: &[String]) -> CaResult<BulkSignResult> {
        validate_names(names)?;

        let req = self
            .request()
            .path("sign")
            .json_body(&CertNames { names })?;
        let data = self.post(req).await?;

        let result = decode_bulk_sign(&data)?;
        log_bulk_sign(&result);
        Ok(result)
    }

    /// Sign every pending CSR the CA holds
    pub async fn sign_all(&self) -> CaResult<BulkSignResult> {
        let data = self.post(self.request().path("sign/all")).await?;

        let result = decode_bulk_sign(&data)?;
        log_bulk_sign(&result);
        Ok(result)
    }
}

fn decode_bulk_sign(data: &[u8]) -> CaResult<BulkSignResult> {
    serde_json::from_slice(data).map_err(|e| CaError::decode("bulk sign result", e))
}

fn log_bulk_sign(result: &BulkSignResult) {
    info!(
        signed = result.signed.len(),
        no_csr = result.no_csr.len(),
        signing_errors = result.signing_errors.len(),
        "Bulk sign completed"
    );
    if !result.signing_errors.is_empty() {
        warn!("Puppet CA failed to sign: {}", result.signing_errors.join(", "));
    }
    if !result.no_csr.is_empty() {
        debug!("No pending request for: {}", result.no_csr.join(", "));
    }
}
