//! Mutual TLS material for the CA connection
//!
//! PEM sources are resolved once, when the client is built. Parsing problems
//! surface as [`CaError::Config`] before any connection is attempted.

use reqwest::{Certificate, Identity};
use tracing::debug;

use crate::config::PemSource;
use crate::utils::error::CaError;

/// Load the client identity from a certificate and its private key
///
/// Both must be files or both inline.
pub fn load_identity(cert: &PemSource, key: &PemSource) -> Result<Identity, CaError> {
    match (cert.is_file(), key.is_file()) {
        (true, false) => {
            return Err(CaError::Config(
                "cert points to a file but key is inline PEM".to_string(),
            ))
        }
        (false, true) => {
            return Err(CaError::Config(
                "cert is inline PEM but key points to a file".to_string(),
            ))
        }
        _ => {}
    }

    let cert_pem = cert.read()?;
    let key_pem = key.read()?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            CaError::Config(format!(
                "Failed to parse client certificate from {}: {}",
                cert.describe(),
                e
            ))
        })?;
    if certs.is_empty() {
        return Err(CaError::Config(format!(
            "No certificates found in {}",
            cert.describe()
        )));
    }

    rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|e| {
            CaError::Config(format!(
                "Failed to parse private key from {}: {}",
                key.describe(),
                e
            ))
        })?
        .ok_or_else(|| CaError::Config(format!("No private key found in {}", key.describe())))?;

    debug!(
        "Loaded {} client certificate(s) from {}",
        certs.len(),
        cert.describe()
    );

    // Combine cert and key into a single PEM bundle for rustls
    let mut pem_bundle = cert_pem;
    pem_bundle.push(b'\n');
    pem_bundle.extend_from_slice(&key_pem);

    Identity::from_pem(&pem_bundle).map_err(|e| {
        CaError::Config(format!(
            "Failed to load client cert from {}: {}",
            cert.describe(),
            e
        ))
    })
}

/// Load the CA bundle; these are the only certificates the client trusts
pub fn load_ca_bundle(ca: &PemSource) -> Result<Vec<Certificate>, CaError> {
    let ca_pem = ca.read()?;

    let certs = Certificate::from_pem_bundle(&ca_pem).map_err(|e| {
        CaError::Config(format!(
            "Failed to parse CA certificate(s) from {}: {}",
            ca.describe(),
            e
        ))
    })?;
    if certs.is_empty() {
        return Err(CaError::Config(format!(
            "No CA certificates found in {}",
            ca.describe()
        )));
    }

    debug!("Parsed {} certificate(s) from CA bundle", certs.len());
    Ok(certs)
}
