//! Certificate status, download, revoke, delete and clean operations
//!
//! Endpoints: `certificate_status`, `certificate_statuses`, `certificate` and
//! `clean` of the `puppet-ca/v1` API.

use tracing::{debug, info};

use crate::models::{pson, CertNames, Certificate, CertificateSave, CertificateState, CleanResult};
use crate::services::client::CaClient;
use crate::services::reconcile::reconcile_clean;
use crate::services::request::segment;
use crate::utils::error::{CaError, CaResult};

/// Body the CA returns from a delete that matched nothing
pub const NOTHING_DELETED: &str = "Nothing was deleted";

/// Reject names the CA could not represent before anything is sent
pub(crate) fn validate_names(names: &[String]) -> CaResult<()> {
    for name in names {
        pson::validate(name)?;
    }
    Ok(())
}

impl CaClient {
    /// Get the status of a certificate or pending request by name
    pub async fn get_certificate(&self, name: &str) -> CaResult<Certificate> {
        let data = self
            .get(self.request().path(format!("certificate_status/{}", segment(name))))
            .await?;

        serde_json::from_slice(&data)
            .map_err(|e| CaError::decode(format!("certificate status for {}", name), e))
    }

    /// Download a signed certificate as PEM text
    pub async fn download_certificate(&self, name: &str) -> CaResult<String> {
        let pem = self
            .get(self.request().path(format!("certificate/{}", segment(name))))
            .await?;

        pem_text(pem, name)
    }

    /// Download the CA's own certificate as PEM text
    pub async fn ca_certificate(&self) -> CaResult<String> {
        self.download_certificate("ca").await
    }

    /// List certificates, optionally only those in `state`
    pub async fn list_certificates(
        &self,
        state: Option<CertificateState>,
    ) -> CaResult<Vec<Certificate>> {
        let req = self
            .request()
            .path("certificate_statuses/any_key")
            .query("state", state.map(|s| s.as_str()).unwrap_or_default());

        let data = self.get(req).await?;
        let certificates: Vec<Certificate> = serde_json::from_slice(&data)
            .map_err(|e| CaError::decode("certificate status list", e))?;

        debug!("Puppet CA returned {} certificate(s)", certificates.len());
        Ok(certificates)
    }

    /// Move a certificate to a new state; success is signalled by status alone
    pub async fn save_certificate(&self, name: &str, update: &CertificateSave) -> CaResult<()> {
        let req = self
            .request()
            .path(format!("certificate_status/{}", segment(name)))
            .json_body(update)?;

        self.put(req).await?;
        info!(
            certname = name,
            state = %update.desired_state(),
            "Certificate state saved"
        );
        Ok(())
    }

    pub async fn revoke_certificate(&self, name: &str) -> CaResult<()> {
        self.save_certificate(name, &CertificateSave::revoked()).await
    }

    /// Discard everything the CA holds for a host without revoking it
    ///
    /// A delete that matched nothing is reported as [`CaError::NotFound`].
    pub async fn delete_certificate(&self, name: &str) -> CaResult<()> {
        let resp = self
            .delete(self.request().path(format!("certificate_status/{}", segment(name))))
            .await?;

        if resp.trim_ascii() == NOTHING_DELETED.as_bytes() {
            return Err(CaError::NotFound(format!(
                "No certificate was deleted named {}",
                name
            )));
        }

        info!(certname = name, "Certificate status deleted");
        Ok(())
    }

    /// Revoke and delete the named certificates in one request
    pub async fn clean_certificates(&self, names: &[String]) -> CaResult<CleanResult> {
        validate_names(names)?;

        let req = self
            .request()
            .path("clean")
            .json_body(&CertNames { names })?;
        let resp = self.put(req).await?;

        let result = reconcile_clean(names, &resp)?;
        info!(
            cleaned = result.cleaned.len(),
            skipped = result.skipped.len(),
            "Certificates cleaned"
        );
        Ok(result)
    }
}

/// PEM is ASCII, so the charset codec does not apply
pub(crate) fn pem_text(data: Vec<u8>, name: &str) -> CaResult<String> {
    String::from_utf8(data).map_err(|e| CaError::decode(format!("PEM for {}", name), e))
}
