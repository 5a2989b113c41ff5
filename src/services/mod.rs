//! Puppet CA API operations

pub mod certificate;
pub mod certificate_request;
pub mod client;
pub mod reconcile;
pub mod request;
pub mod tls;

pub use certificate::NOTHING_DELETED;
pub use client::{CaClient, API_PATH};
pub use reconcile::CLEAN_SKIPPED_PREFIX;
pub use request::CaRequest;
