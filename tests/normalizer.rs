//! End-to-end normalization through the public library API.

use std::collections::HashMap;
use std::sync::Arc;

use pretty_router::cache::{MemoryCache, NoCache};
use pretty_router::request::{Normalized, RawRequest, RedirectReason, RequestNormalizer, Separator};
use pretty_router::routing::Registry;
use pretty_router::security::{ProxyPolicy, ProxyTrustResolver};
use pretty_router::store::{TopicLocator, MSG_TOPIC_TTL};
use pretty_router::{CleanRequest, RequestError};

mod common;

use common::BASE;

fn normalizer(separator: Separator) -> RequestNormalizer {
    let locator = TopicLocator::new(
        Arc::new(MemoryCache::new()),
        Arc::new(HashMap::from([(77u64, 9u64)])),
        MSG_TOPIC_TTL,
    );
    RequestNormalizer::new(
        Arc::new(Registry::with_defaults()),
        ProxyTrustResolver::new(&ProxyPolicy::Autodetect, &["10.0.0.0/8".to_string()]),
        separator,
        BASE,
    )
    .with_topic_locator(locator)
}

fn clean(raw: RawRequest) -> CleanRequest {
    match normalizer(Separator::Semicolon).clean(&raw) {
        Ok(Normalized::Clean(clean)) => clean,
        other => panic!("expected clean request, got {other:?}"),
    }
}

#[test]
fn test_query_string_beats_path() {
    let req = clean(RawRequest::new("/topics/42/20", "topic=43;start=40"));
    assert_eq!(req.params.get_str("topic"), Some("43"));
    assert_eq!(req.params.get_str("start"), Some("40"));
}

#[test]
fn test_pretty_suffix_and_legacy_forms() {
    let html = clean(RawRequest::new("/boards/3.news.html", ""));
    assert_eq!(html.params.get_str("board"), Some("3"));

    let legacy = clean(RawRequest::new("/board,2.40/", ""));
    assert_eq!(legacy.params.serialize(";"), "board=2;start=40");

    let wap = clean(RawRequest::new("/topic,5.msg9/&wap2", ""));
    assert_eq!(wap.params.get_str("topic"), Some("5"));
    assert_eq!(wap.params.get_str("start"), Some("msg9"));
    assert!(wap.params.contains("wap2"));
}

#[test]
fn test_start_always_present() {
    for query in ["", "action=help", "board=1", "topic=2.msg0", "topic=2.new"] {
        let req = clean(RawRequest::new("", query));
        assert!(req.params.get_str("start").is_some(), "missing start for {query:?}");
    }
    assert_eq!(clean(RawRequest::new("", "topic=2.-4")).params.get_str("start"), Some("0"));
}

#[test]
fn test_numeric_keys_rejected_under_both_separators() {
    for separator in [Separator::Semicolon, Separator::Ampersand] {
        let result = normalizer(separator).clean(&RawRequest::new("", "topic=1&0=x"));
        assert_eq!(result, Err(RequestError::NumericKey("0".into())));
    }
}

#[test]
fn test_ampersand_separator_keeps_semicolons_in_values() {
    let result = normalizer(Separator::Ampersand).clean(&RawRequest::new("", "search=a;b&topic=4"));
    let Ok(Normalized::Clean(req)) = result else {
        panic!("expected clean request");
    };
    assert_eq!(req.params.get_str("search"), Some("a;b"));
}

#[test]
fn test_url_shaped_query_rejected() {
    let result = normalizer(Separator::Semicolon).clean(&RawRequest::new("", "HTTPS://evil.example/x"));
    assert_eq!(result, Err(RequestError::UrlInQuery));
}

#[test]
fn test_message_to_topic_redirect() {
    let result = normalizer(Separator::Semicolon).clean(&RawRequest::new("", "msg=77"));
    let Ok(Normalized::Redirect(redirect)) = result else {
        panic!("expected redirect, got {result:?}");
    };
    assert_eq!(redirect.reason, RedirectReason::MessageToTopic);
    assert!(redirect.location.ends_with("?topic=9.msg77#msg77"));
}

#[test]
fn test_activation_redirect_is_case_insensitive() {
    let result = normalizer(Separator::Semicolon).clean(&RawRequest::new("", "action=activate%3Bu%3D3"));
    let Ok(Normalized::Redirect(redirect)) = result else {
        panic!("expected redirect, got {result:?}");
    };
    assert_eq!(redirect.reason, RedirectReason::ActivationLink);
    assert_eq!(redirect.location, format!("{BASE}?action=activate;u=3"));
    assert_eq!(redirect.status_code(), 301);
}

#[test]
fn test_trusted_proxy_chain() {
    let raw = RawRequest::new("", "")
        .with_remote_addr("10.1.2.3")
        .with_header("X-Forwarded-For", "198.51.100.7, 192.168.1.1");
    assert_eq!(clean(raw).client.ban_check_ip, "198.51.100.7");

    let untrusted = RawRequest::new("", "")
        .with_remote_addr("203.0.113.9")
        .with_header("X-Forwarded-For", "198.51.100.7");
    assert_eq!(clean(untrusted).client.ban_check_ip, "203.0.113.9");
}

#[test]
fn test_without_locator_msg_is_kept() {
    let n = RequestNormalizer::new(
        Arc::new(Registry::with_defaults()),
        ProxyTrustResolver::new(&ProxyPolicy::Disabled, &[]),
        Separator::Semicolon,
        BASE,
    );
    let Ok(Normalized::Clean(req)) = n.clean(&RawRequest::new("", "msg=77")) else {
        panic!("expected clean request");
    };
    assert_eq!(req.params.get_str("msg"), Some("77"));

    let cached = TopicLocator::new(Arc::new(NoCache), Arc::new(HashMap::<u64, u64>::new()), MSG_TOPIC_TTL);
    assert_eq!(cached.locate(77), None);
}
