//! OpenVox CA client library
//!
//! A client for the Puppet CA HTTP API (`puppet-ca/v1`). It authenticates
//! with mutual TLS, manages certificates and signing requests, and converts
//! text to and from the ISO-8859-1 character set the CA speaks.
//!
//! ```no_run
//! use openvox_ca_client::{AppConfig, CaClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::load(None)?;
//! let ca = CaClient::new(&config.puppet_ca)?;
//! for cert in ca.list_certificate_requests().await? {
//!     println!("{}", cert.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use models::{
    BulkSignResult, Certificate, CertificateSave, CertificateState, CleanResult,
};
pub use services::{CaClient, CaRequest};
pub use utils::error::{CaError, CaResult};
