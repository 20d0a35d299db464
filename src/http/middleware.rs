//! Request normalization and output rewriting middleware.
//!
//! # Responsibilities
//! - Run every request through the normalizer before any handler
//! - Answer rejections with 400 and legacy links with redirects
//! - Rewrite internal links in HTML responses to pretty routes
//! - Record request counters and latency

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::request::{Normalized, RawRequest, Redirect};
use crate::slug::CachedSlugs;

/// Largest HTML body the rewriter will buffer.
const MAX_REWRITE_BODY: usize = 8 * 1024 * 1024;

/// Bytes escaped in `Location` targets on top of every non-ASCII byte.
/// Existing `%XX` escapes pass through untouched.
const LOCATION_ESCAPES: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>');

/// Header carrying the pre-rewrite URI from a front server.
const ORIGINAL_URI: &str = "x-original-uri";

pub async fn normalize_request(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let raw = raw_request(&state, &req);

    match state.normalizer.clean(&raw) {
        Ok(Normalized::Clean(clean)) => {
            tracing::debug!(
                request_id = %req.request_id(),
                ban_check_ip = %clean.client.ban_check_ip,
                "Request accepted"
            );
            req.extensions_mut().insert(clean);
            next.run(req).await
        }
        Ok(Normalized::Redirect(redirect)) => redirect_response(&state, &redirect),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn prettify_html(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if !state.pretty_enabled() || !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_REWRITE_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer HTML response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = match String::from_utf8(bytes.to_vec()) {
        Ok(html) => html,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    let slugs = CachedSlugs(state.cache.as_ref());
    let rewritten = state.rewriter.rewrite(&html, &state.registry, &slugs);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(rewritten))
}

pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let response = next.run(req).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// Emits a redirect, prettifying the target when pretty URLs are on.
pub fn redirect_response(state: &AppState, redirect: &Redirect) -> Response {
    let location = if state.pretty_enabled() {
        let slugs = CachedSlugs(state.cache.as_ref());
        state
            .rewriter
            .rewrite_url(&redirect.location, &state.registry, &slugs)
    } else {
        redirect.location.clone()
    };
    let location = encode_location(&location);

    let status = StatusCode::from_u16(redirect.status_code()).unwrap_or(StatusCode::FOUND);
    Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, location = %redirect.location, "Invalid redirect target");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Percent-encodes Unicode slugs and stray unsafe bytes so the header is
/// plain ASCII.
fn encode_location(location: &str) -> String {
    utf8_percent_encode(location, LOCATION_ESCAPES).to_string()
}

fn raw_request(state: &AppState, req: &Request) -> RawRequest {
    let path = req.uri().path();
    let path_info = match path.strip_prefix(state.script_path.as_str()) {
        Some(rest) if !state.script_path.is_empty() => rest,
        _ => path,
    };

    let original_query = req
        .headers()
        .get(ORIGINAL_URI)
        .and_then(|v| v.to_str().ok())
        .and_then(|uri| uri.split_once('?'))
        .map(|(_, query)| query.to_string());

    RawRequest {
        path_info: path_info.to_string(),
        query_string: req.uri().query().unwrap_or_default().to_string(),
        original_query_string: original_query,
        remote_addr: req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
        headers: req.headers().clone(),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_encoding() {
        assert_eq!(
            encode_location("https://f.example/index.php/topics/42.日本"),
            "https://f.example/index.php/topics/42.%E6%97%A5%E6%9C%AC"
        );
        assert_eq!(
            encode_location("https://f.example/index.php?search=fish%26chips#msg5"),
            "https://f.example/index.php?search=fish%26chips#msg5"
        );
    }
}
