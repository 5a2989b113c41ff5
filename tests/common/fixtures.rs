//! Test fixtures for common test data
//!
//! Fixtures provide pre-defined test data that can be used across multiple tests.

use std::path::PathBuf;

use tempfile::TempDir;

/// Client identity and CA bundle as PEM text
#[derive(Debug, Clone)]
pub struct TlsFixture {
    pub cert_pem: String,
    pub key_pem: String,
    pub ca_pem: String,
}

impl TlsFixture {
    /// A CA and a client certificate it signed
    pub fn generate() -> Self {
        let ca_key = rcgen::KeyPair::generate().unwrap();
        let mut ca_params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Puppet CA: puppet.example.com");
        let ca_cert = ca_params.self_signed(&ca_key).unwrap();
        let issuer = rcgen::Issuer::new(ca_params, ca_key);

        let client_key = rcgen::KeyPair::generate().unwrap();
        let mut client_params =
            rcgen::CertificateParams::new(vec!["admin.example.com".to_string()]).unwrap();
        client_params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "admin.example.com");
        let client_cert = client_params.signed_by(&client_key, &issuer).unwrap();

        Self {
            cert_pem: client_cert.pem(),
            key_pem: client_key.serialize_pem(),
            ca_pem: ca_cert.pem(),
        }
    }

    /// Write the PEMs to a temporary directory
    pub fn write_files(&self) -> TlsFiles {
        let dir = tempfile::tempdir().unwrap();
        let cert = dir.path().join("admin.pem");
        let key = dir.path().join("admin.key");
        let ca = dir.path().join("ca.pem");

        std::fs::write(&cert, &self.cert_pem).unwrap();
        std::fs::write(&key, &self.key_pem).unwrap();
        std::fs::write(&ca, &self.ca_pem).unwrap();

        TlsFiles {
            _dir: dir,
            cert,
            key,
            ca,
        }
    }
}

/// PEM files on disk; removed when dropped
pub struct TlsFiles {
    _dir: TempDir,
    pub cert: PathBuf,
    pub key: PathBuf,
    pub ca: PathBuf,
}

/// Canned `certificate_status` bodies
pub struct StatusFixtures;

impl StatusFixtures {
    pub fn signed(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "state": "signed",
            "fingerprint": "A6:E3:3B:6F",
            "fingerprints": {
                "SHA1": "1F:2E:3D",
                "SHA256": "A6:E3:3B:6F",
                "default": "A6:E3:3B:6F"
            },
            "dns_alt_names": [format!("DNS:{}", name), "DNS:puppet"],
            "subject_alt_names": [format!("DNS:{}", name), "DNS:puppet"],
            "authorization_extensions": {"pp_cli_auth": "true"},
            "serial_number": 12,
            "not_before": "2025-10-13T09:30:00UTC",
            "not_after": "2030-10-13T09:30:00UTC"
        })
    }

    pub fn requested(name: &str) -> serde_json::Value {
        serde_json::json!({
            "name": name,
            "state": "requested",
            "fingerprint": "C0:FF:EE",
            "fingerprints": {"SHA256": "C0:FF:EE", "default": "C0:FF:EE"},
            "dns_alt_names": [],
            "authorization_extensions": {}
        })
    }
}

pub const TEST_CSR: &str = "-----BEGIN CERTIFICATE REQUEST-----\n\
MIIBVjCB/gIBADAcMRowGAYDVQQDDBFub2RlMS5leGFtcGxlLmNvbTBZMBMGByqG\n\
-----END CERTIFICATE REQUEST-----\n";
