// crates/attribution-core/tests/sites.rs
// ============================================================================
// Module: Site Helper Tests
// Description: Validate origin and top-private-domain extraction.
// Purpose: Ensure URI normalization is stable and fails to None, never panics.
// Dependencies: attribution-core
// ============================================================================

//! Origin and site extraction over app and web URIs, including the `None`
//! branches that feed the gates' "cannot verify" behaviour.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use attribution_core::DestinationType;
use attribution_core::sites::origin;
use attribution_core::sites::site_for;
use attribution_core::sites::top_private_domain_and_scheme;

#[test]
fn origin_keeps_scheme_host_and_port() {
    assert_eq!(
        origin("https://shop.example.com/cart?item=1"),
        Some("https://shop.example.com".to_string())
    );
    assert_eq!(
        origin("https://shop.example.com:8443/cart"),
        Some("https://shop.example.com:8443".to_string())
    );
    assert_eq!(
        origin("android-app://com.example.shop/landing"),
        Some("android-app://com.example.shop".to_string())
    );
}

#[test]
fn top_private_domain_keeps_the_final_two_labels() {
    assert_eq!(
        top_private_domain_and_scheme("https://checkout.shop.example.com/cart"),
        Some("https://example.com".to_string())
    );
    assert_eq!(
        top_private_domain_and_scheme("https://example.com"),
        Some("https://example.com".to_string())
    );
    assert_eq!(
        top_private_domain_and_scheme("https://localhost/admin"),
        Some("https://localhost".to_string())
    );
}

#[test]
fn site_form_depends_on_the_destination_type() {
    assert_eq!(
        site_for("android-app://com.example.shop/landing", DestinationType::App),
        Some("android-app://com.example.shop".to_string())
    );
    assert_eq!(
        site_for("https://checkout.shop.example.com/cart", DestinationType::Web),
        Some("https://example.com".to_string())
    );
}

#[test]
fn unparseable_uris_yield_none() {
    assert_eq!(origin("not a uri"), None);
    assert_eq!(top_private_domain_and_scheme(""), None);
    assert_eq!(site_for("%%%", DestinationType::Web), None);
}
