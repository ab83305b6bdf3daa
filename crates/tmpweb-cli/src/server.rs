//! HTTP dispatch: uploads, reaping, health checks and static site serving.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use tmpweb_core::SiteError;
use tmpweb_core::SiteId;
use tmpweb_core::SiteLifecycle;
use tmpweb_core::Upload;
use tmpweb_core::serve::ServeOutcome;
use tmpweb_core::serve::content_type_for;
use tmpweb_core::serve::resolve_request;
use tmpweb_core::site::unix_now;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    lifecycle: Arc<SiteLifecycle>,
}

impl AppState {
    pub fn new(lifecycle: Arc<SiteLifecycle>) -> Self {
        Self { lifecycle }
    }
}

/// Query parameters accepted by `POST /`.
#[derive(Debug, Default, Deserialize)]
struct CreateParams {
    retention_days: Option<u64>,
    redirect: Option<bool>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_handler).delete(reap_handler))
        .route("/ping", get(ping_handler))
        .route("/:site_id", get(site_handler))
        .route("/:site_id/", get(site_handler))
        .route("/:site_id/*rest", get(site_handler))
        // Upload size is enforced against max_site_size in the handler.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// POST / - publish the request body as a new site.
async fn create_handler(
    State(state): State<AppState>,
    Query(params): Query<CreateParams>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let max = state.lifecycle.config().max_site_size;
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    if let Some(size) = declared
        && size > max
    {
        return site_error_response(&SiteError::PayloadTooLarge { size, max });
    }

    let limit = usize::try_from(max).unwrap_or(usize::MAX);
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::info!(error = %err, "upload body rejected");
            return site_error_response(&SiteError::PayloadTooLarge {
                size: max.saturating_add(1),
                max,
            });
        }
    };

    let mut upload = Upload::new(bytes.to_vec());
    if let Some(size) = declared {
        upload = upload.with_content_length(size);
    }
    if let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        upload = upload.with_content_type(content_type);
    }
    if let Some(days) = params.retention_days {
        upload = upload.with_retention_days(days);
    }

    match state.lifecycle.create_site(upload).await {
        Ok(created) if params.redirect.unwrap_or(false) => {
            let url = created.url;
            let page = format!(
                "<!DOCTYPE html><html><body>Your site is available at <a href=\"{url}\">{url}</a>.</body></html>"
            );
            (
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, url),
                    (header::CONTENT_TYPE, "text/html".to_string()),
                ],
                page,
            )
                .into_response()
        }
        Ok(created) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            created.url,
        )
            .into_response(),
        Err(err) => site_error_response(&err),
    }
}

/// DELETE / - reap expired sites. Loopback clients only.
async fn reap_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    // Without ConnectInfo (e.g. in tests) the peer counts as non-loopback.
    let peer = connect_info.map(|ci| ci.0.ip());
    let client = client_address(&headers, peer);

    if !client.is_some_and(is_loopback) {
        tracing::warn!(client = ?client, "refusing reap from non-loopback client");
        return StatusCode::FORBIDDEN.into_response();
    }

    match state.lifecycle.reap_expired(unix_now()).await {
        Ok(count) => {
            tracing::info!(count, "reaped expired sites");
            StatusCode::OK.into_response()
        }
        Err(err) => site_error_response(&err),
    }
}

async fn ping_handler() -> StatusCode {
    StatusCode::OK
}

/// GET /{site_id}/... - serve a file from a live site.
async fn site_handler(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
) -> Response {
    let Some(raw_id) = params.get("site_id") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(site_id) = SiteId::parse(raw_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.lifecycle.live_site(&site_id, unix_now()).await {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => return site_error_response(&err),
    }

    let path = match params.get("rest") {
        Some(rest) => format!("/{rest}"),
        None if uri.path().ends_with('/') => "/".to_string(),
        None => String::new(),
    };

    match resolve_request(&state.lifecycle.config().web_root, &site_id, &path) {
        ServeOutcome::File(path) => match tokio::fs::read(&path).await {
            Ok(contents) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type_for(&path))],
                contents,
            )
                .into_response(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND.into_response()
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to read site file");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        ServeOutcome::Redirect(location) => {
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
        }
        ServeOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Maps a lifecycle error to a status and a client-safe plaintext body.
fn site_error_response(err: &SiteError) -> Response {
    let status = match err {
        SiteError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        SiteError::BadRequest(_) => StatusCode::BAD_REQUEST,
        SiteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::info!(error = %err, "request rejected");
    }
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        err.public_message(),
    )
        .into_response()
}

/// Picks the client address: last hop of `Forwarded`, else last hop of
/// `X-Forwarded-For`, else the socket peer.
///
/// A header that is present but unparseable yields `None`.
fn client_address(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get(header::FORWARDED) {
        let last = forwarded.to_str().ok()?.rsplit(',').next()?;
        let node = last
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("for"))
            .map(|(_, value)| value)?;
        return parse_node(node);
    }
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        let last = forwarded_for.to_str().ok()?.rsplit(',').next()?;
        return parse_node(last);
    }
    peer
}

/// Parses a forwarded node: `1.2.3.4`, `1.2.3.4:80`, `"[::1]:80"` or `::1`.
fn parse_node(raw: &str) -> Option<IpAddr> {
    let node = raw.trim().trim_matches('"');
    if let Some(bracketed) = node.strip_prefix('[') {
        let (addr, _) = bracketed.split_once(']')?;
        return addr.parse().ok();
    }
    if let Ok(ip) = node.parse() {
        return Some(ip);
    }
    node.parse::<SocketAddr>().ok().map(|addr| addr.ip())
}

fn is_loopback(ip: IpAddr) -> bool {
    ip.to_canonical().is_loopback()
}
