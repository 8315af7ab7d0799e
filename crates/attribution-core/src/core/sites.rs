// crates/attribution-core/src/core/sites.rs
// ============================================================================
// Module: Attribution Site Helpers
// Description: Origin and top-private-domain extraction for publisher and destination URIs.
// Purpose: Normalize untrusted URIs into the site/origin forms used by privacy gates.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Privacy gates and attribution bookkeeping operate on two normalized URI
//! forms: the *origin* (scheme plus authority) and the *site* (scheme plus
//! registrable domain for web destinations, base URI for app destinations).
//! Extraction failures surface as `None` so enclosing checks can take their
//! "cannot verify" branch instead of failing the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use url::Url;

use crate::core::destination::DestinationType;

// ============================================================================
// SECTION: Origin Extraction
// ============================================================================

/// Returns the origin (`scheme://host[:port]`) of the URI, or `None` when the
/// URI does not parse or carries no host.
#[must_use]
pub fn origin(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let host = url.host_str()?;
    let scheme = url.scheme();
    Some(url.port().map_or_else(
        || format!("{scheme}://{host}"),
        |port| format!("{scheme}://{host}:{port}"),
    ))
}

// ============================================================================
// SECTION: Site Extraction
// ============================================================================

/// Returns the top-private-domain-and-scheme form (`scheme://domain`) of a web
/// URI, or `None` when the URI does not parse or carries no host.
///
/// Registrable-domain extraction keeps the final two labels of the host;
/// single-label and IP hosts are kept whole. Multi-label public suffixes are
/// out of scope for the engine and belong to the registration pipeline.
#[must_use]
pub fn top_private_domain_and_scheme(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let host = url.host_str()?;
    let domain = registrable_domain(host);
    Some(format!("{}://{domain}", url.scheme()))
}

/// Returns the site form of a URI for the destination type: base URI for app
/// destinations, top-private-domain-and-scheme for web destinations.
#[must_use]
pub fn site_for(uri: &str, destination_type: DestinationType) -> Option<String> {
    match destination_type {
        DestinationType::App => origin(uri),
        DestinationType::Web => top_private_domain_and_scheme(uri),
    }
}

/// Keeps the final two labels of a dotted host; other hosts are kept whole.
fn registrable_domain(host: &str) -> &str {
    let mut labels = host.rsplitn(3, '.');
    let last = labels.next();
    let second = labels.next();
    match (second, last, labels.next()) {
        (Some(second), Some(last), Some(_)) => {
            let keep = second.len() + 1 + last.len();
            let start = host.len() - keep;
            host.get(start..).unwrap_or(host)
        }
        _ => host,
    }
}
