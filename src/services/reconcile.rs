//! Bulk clean reconciliation
//!
//! The `clean` endpoint does not report per-name outcomes. When some names
//! were unknown it answers with a sentence followed by a JSON list of them,
//! and the client works out what was actually cleaned from the names it sent.

use std::collections::HashSet;

use serde::Deserialize;

use crate::models::{pson, CleanResult};
use crate::utils::error::CaError;

/// Text the CA puts in front of the list of unknown names
pub const CLEAN_SKIPPED_PREFIX: &str = "The following certs do not exist and cannot be revoked: ";

#[derive(Deserialize)]
#[serde(transparent)]
struct SkippedNames(#[serde(with = "pson::list")] Vec<String>);

/// Names the CA reported as skipped, empty when the prefix is absent
pub fn parse_skipped(body: &[u8]) -> Result<Vec<String>, CaError> {
    let prefix = CLEAN_SKIPPED_PREFIX.as_bytes();
    let Some(pos) = body.windows(prefix.len()).position(|w| w == prefix) else {
        return Ok(Vec::new());
    };

    // Only the first JSON value counts; trailing text is ignored
    let rest = &body[pos + prefix.len()..];
    match serde_json::Deserializer::from_slice(rest)
        .into_iter::<SkippedNames>()
        .next()
    {
        Some(Ok(SkippedNames(names))) => Ok(names),
        Some(Err(e)) => Err(CaError::decode("list of skipped certificates", e)),
        None => Ok(Vec::new()),
    }
}

/// Split `requested` into cleaned and skipped names, keeping request order
///
/// Skipped names the caller never asked for are dropped: classification is
/// driven by the request, not by the server's list.
pub fn reconcile_clean(requested: &[String], body: &[u8]) -> Result<CleanResult, CaError> {
    let skipped_names = parse_skipped(body)?;
    let skipped_set: HashSet<&str> = skipped_names.iter().map(String::as_str).collect();

    let (skipped, cleaned): (Vec<String>, Vec<String>) = requested
        .iter()
        .cloned()
        .partition(|name| skipped_set.contains(name.as_str()));

    Ok(CleanResult { cleaned, skipped })
}
