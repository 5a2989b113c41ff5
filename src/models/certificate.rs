//! Certificate and CSR models for Puppet CA management

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::pson;

/// Certificate lifecycle state as reported by the CA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateState {
    /// A CSR is waiting to be signed
    Requested,
    /// Certificate is signed and valid
    Signed,
    /// Certificate has been revoked
    Revoked,
}

impl CertificateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateState::Requested => "requested",
            CertificateState::Signed => "signed",
            CertificateState::Revoked => "revoked",
        }
    }
}

impl fmt::Display for CertificateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(CertificateState::Requested),
            "signed" => Ok(CertificateState::Signed),
            "revoked" => Ok(CertificateState::Revoked),
            other => Err(format!("unknown certificate state: {}", other)),
        }
    }
}

impl Serialize for CertificateState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        pson::serialize(self.as_str(), serializer)
    }
}

impl<'de> Deserialize<'de> for CertificateState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        pson::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// A certificate or pending request, as returned by `certificate_status`
///
/// Text fields are decoded from the CA's ISO-8859-1 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Node certname (CN)
    #[serde(with = "pson")]
    pub name: String,
    pub state: CertificateState,
    #[serde(default, with = "pson::list")]
    pub dns_alt_names: Vec<String>,
    #[serde(default, with = "pson::list")]
    pub subject_alt_names: Vec<String>,
    #[serde(default, with = "pson::map")]
    pub authorization_extensions: BTreeMap<String, String>,
    /// Absent for requests that have not been signed
    #[serde(default, with = "pson::option", skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    #[serde(default, with = "pson::option", skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
    #[serde(default, alias = "serial_number")]
    pub serial: i64,
    /// Default digest fingerprint
    #[serde(default, with = "pson")]
    pub fingerprint: String,
    /// Fingerprints keyed by digest algorithm
    #[serde(default, with = "pson::map")]
    pub fingerprints: BTreeMap<String, String>,
}

impl Certificate {
    pub fn not_before_utc(&self) -> Option<DateTime<Utc>> {
        self.not_before.as_deref().and_then(parse_ca_timestamp)
    }

    pub fn not_after_utc(&self) -> Option<DateTime<Utc>> {
        self.not_after.as_deref().and_then(parse_ca_timestamp)
    }

    /// True when the validity window ended before `at`
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.not_after_utc().is_some_and(|not_after| not_after < at)
    }
}

/// Parse a CA timestamp, either RFC 3339 or the `2026-10-14T09:30:00UTC` form
fn parse_ca_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SUTC")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Body of a `certificate_status` save
///
/// A TTL is only carried when signing, and only when it is non-zero: the CA
/// treats an explicit zero differently from an absent TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSave {
    desired_state: CertificateState,
    #[serde(rename = "cert_ttl", skip_serializing_if = "Option::is_none")]
    ttl: Option<u64>,
}

impl CertificateSave {
    /// Sign the pending request, optionally with a TTL in seconds
    pub fn signed(ttl: Option<u64>) -> Self {
        Self {
            desired_state: CertificateState::Signed,
            ttl: ttl.filter(|secs| *secs > 0),
        }
    }

    pub fn revoked() -> Self {
        Self {
            desired_state: CertificateState::Revoked,
            ttl: None,
        }
    }

    pub fn desired_state(&self) -> CertificateState {
        self.desired_state
    }

    pub fn ttl(&self) -> Option<u64> {
        self.ttl
    }
}

/// Names sent to the bulk `sign` and `clean` endpoints
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CertNames<'a> {
    #[serde(rename = "certnames", with = "pson::list")]
    pub names: &'a [String],
}

/// Per-name outcome of a bulk sign, verbatim from the CA
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSignResult {
    #[serde(default, with = "pson::list")]
    pub signed: Vec<String>,
    /// Names without a pending CSR
    #[serde(rename = "no-csr", default, with = "pson::list")]
    pub no_csr: Vec<String>,
    #[serde(rename = "signing-errors", default, with = "pson::list")]
    pub signing_errors: Vec<String>,
}

/// Outcome of a clean, reconciled against the requested names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanResult {
    pub cleaned: Vec<String>,
    /// Requested names the CA had nothing for
    pub skipped: Vec<String>,
}
