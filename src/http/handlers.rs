//! Demo page handler.
//!
//! Renders the canonical parameters of the request, after checking that
//! the addressed entity was requested with its canonical slug.

use axum::{
    extract::{Request, State},
    http::header,
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;

use crate::http::middleware::redirect_response;
use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::request::addressing::parse_id;
use crate::request::CleanRequest;
use crate::slug::{SlugKind, SlugOutcome, Slugger};

pub async fn echo(State(state): State<AppState>, req: Request) -> Response {
    let Some(clean) = req.extensions().get::<CleanRequest>().cloned() else {
        tracing::error!("Handler reached without a normalized request");
        return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let slug = match canonical_slug(&state, &clean) {
        Some(SlugOutcome::Redirect(redirect)) => {
            metrics::record_redirect(redirect.reason.as_str());
            return redirect_response(&state, &redirect);
        }
        Some(SlugOutcome::Canonical(slug)) => Some(slug),
        None => None,
    };

    let wants_html = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        return Html(render_page(&state, &clean)).into_response();
    }

    Json(json!({
        "request_id": req.request_id(),
        "params": clean.params,
        "requested_slug": clean.requested_slug,
        "slug": slug,
        "client": clean.client,
    }))
    .into_response()
}

/// Slug check for the entity the request addresses. `None` when the
/// request addresses no titled entity.
fn canonical_slug(state: &AppState, clean: &CleanRequest) -> Option<SlugOutcome> {
    let (kind, id) = primary_entity(clean)?;
    let title = state.titles.title(kind, id)?;

    let mut slugger = Slugger::new(
        state.slug_options.clone(),
        state.patterns.clone(),
        state.cache.clone(),
        state.normalizer.base_url(),
        state.normalizer.separator().as_str(),
    )
    .with_requested(clean.requested_slug.clone());

    Some(slugger.resolve(&title, kind, id, &clean.unescaped))
}

fn primary_entity(clean: &CleanRequest) -> Option<(SlugKind, u64)> {
    if let Some(requested) = &clean.requested_slug {
        return Some((requested.kind, requested.id));
    }
    [("topic", SlugKind::Topic), ("board", SlugKind::Board)]
        .into_iter()
        .find_map(|(key, kind)| {
            clean
                .params
                .get_str(key)
                .and_then(parse_id)
                .filter(|id| *id > 0)
                .map(|id| (kind, id))
        })
}

fn render_page(state: &AppState, clean: &CleanRequest) -> String {
    let base = state.normalizer.base_url();
    let sep = state.normalizer.separator().as_str();
    let canonical = format!("{}?{}", base, clean.params.serialize(sep));

    let rows: String = clean
        .params
        .iter()
        .map(|(key, value)| {
            let value = value.as_str().unwrap_or("[list]");
            format!("<li><code>{}</code> = <code>{}</code></li>", html_escape::encode_text(key), value)
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html><head><link rel=\"canonical\" href=\"{canonical}\"></head>\
         <body><a href=\"{canonical}\">permalink</a><ul>{rows}</ul></body></html>"
    )
}
