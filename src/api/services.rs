use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{
    error::ApiError,
    state::{AppState, ResourceEndpoint},
    utils::{parse_extras, path_unescape, strip_json_suffix, unescape_id},
};
use crate::handlers::{Extra, RequestContext, ResourceKind, ResourceRequest};
use crate::metadata::MediaRef;
use crate::observability::MetricsSnapshot;
use crate::userdata::UserData;

/// Shape of a registered resource route
///
/// `/{userData}/{kind}/{type}/{id}[/{extras}]` when `user_data` is set,
/// `/{kind}/{type}/{id}[/{extras}]` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRoute {
    pub kind: ResourceKind,
    pub user_data: bool,
    pub extras: bool,
}

impl ResourceRoute {
    /// Axum path pattern of this route
    pub fn path(&self) -> String {
        let mut path = String::new();
        if self.user_data {
            path.push_str("/{ud}");
        }
        path.push('/');
        path.push_str(self.kind.as_str());
        path.push_str("/{type}/{id}");
        if self.extras {
            path.push_str("/{extras}");
        }
        path
    }
}

/// Raw, still percent-encoded segments of a resource path
#[derive(Debug, PartialEq, Eq)]
struct RawSegments<'a> {
    user_data: &'a str,
    media_type: &'a str,
    id: &'a str,
    extras: Option<&'a str>,
}

impl<'a> RawSegments<'a> {
    /// Split the request path by position
    ///
    /// Axum decodes `Path` parameters, which would make an escaped `/`
    /// indistinguishable from a separator, so segments are taken raw.
    fn split(route: ResourceRoute, path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let offset = usize::from(route.user_data);

        Some(Self {
            user_data: if route.user_data { *segments.first()? } else { "" },
            media_type: *segments.get(offset + 1)?,
            id: *segments.get(offset + 2)?,
            extras: if route.extras {
                Some(*segments.get(offset + 3)?)
            } else {
                None
            },
        })
    }
}

/// Resource endpoint shared by all kinds and route shapes
///
/// ## Flow:
/// 1. Decode the id segment (`.json` stripped on routes without extras)
/// 2. Look up the handler for the media type
/// 3. Decode user data and the extras segment
/// 4. For streams, look up metadata when enrichment is enabled
/// 5. Run the handler against the request deadline
/// 6. Wrap the result as `{"<key>":<result>}` and apply the cache policy
///
/// Any failure ends the request with a bare 400, 404 or 500.
pub async fn resource(
    state: AppState,
    route: ResourceRoute,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let response = match dispatch(&state, route, &uri, &headers).await {
        Ok(response) => response,
        Err(err) => {
            debug!(kind = %route.kind, url = %uri, error = %err, "Request rejected");
            err.into_response()
        }
    };

    state.metrics.record_response(response.status());
    response
}

async fn dispatch(
    state: &AppState,
    route: ResourceRoute,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let kind = route.kind;
    let endpoint = state
        .endpoint(kind)
        .ok_or_else(|| ApiError::NotFound(format!("no {kind} handlers")))?;

    let raw = RawSegments::split(route, uri.path())
        .ok_or_else(|| ApiError::NotFound(uri.path().to_string()))?;

    let id_segment = if route.extras {
        raw.id
    } else {
        strip_json_suffix(raw.id)
            .ok_or_else(|| ApiError::NotFound(format!("missing .json suffix: {}", raw.id)))?
    };
    let id = unescape_id(id_segment)?;
    let media_type = path_unescape(raw.media_type)?;

    let handler = endpoint.registry.get(&media_type)?;

    let user_data = if route.user_data {
        state
            .codec
            .decode(raw.user_data)
            .inspect_err(|err| warn!(kind = %kind, error = %err, "Couldn't decode user data"))?
    } else {
        UserData::None
    };

    let extra = match raw.extras {
        Some(segment) => parse_extras(segment)?,
        None => Extra::default(),
    };

    let mut ctx = RequestContext::new(kind, state.config.server.request_timeout.as_duration());
    if kind == ResourceKind::Stream {
        ctx.meta = enrich(state, &media_type, &id, &ctx).await;
    }

    let request = ResourceRequest {
        kind,
        media_type: media_type.clone(),
        id: id.clone(),
        extra,
        user_data,
    };

    let body = tokio::time::timeout_at(ctx.deadline, handler.handle_json(ctx.clone(), request))
        .await
        .unwrap_or_else(|_| Err(crate::handlers::HandlerError::Timeout))
        .map_err(|err| {
            let err = ApiError::from(err);
            if let ApiError::Internal(msg) = &err {
                error!(kind = %kind, media_type = %media_type, id = %id, error = %msg, "Handler failed");
            }
            err
        })?;

    Ok(respond(endpoint, kind, &body, headers))
}

/// Look up metadata for a stream request
///
/// Failures never fail the request; the handler simply runs without it.
async fn enrich(
    state: &AppState,
    media_type: &str,
    id: &str,
    ctx: &RequestContext,
) -> Option<crate::types::MetaItem> {
    let fetcher = state.meta_fetcher.as_ref()?;
    let media = MediaRef::parse(media_type, id)?;

    match media.fetch(fetcher.as_ref(), ctx.deadline).await {
        Ok(meta) => {
            if state.config.meta.log_media_name {
                info!(media_type, id, name = %meta.name, "Media name");
            }
            state.config.meta.put_meta_in_context.then_some(meta)
        }
        Err(err) => {
            warn!(media_type, id, error = %err, "Couldn't get meta for stream request");
            state.metrics.meta_lookup_failed();
            None
        }
    }
}

fn respond(endpoint: &ResourceEndpoint, kind: ResourceKind, body: &[u8], headers: &HeaderMap) -> Response {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());
    let outcome = endpoint.cache.evaluate(body, if_none_match);

    let mut response = match &outcome {
        Some(outcome) if outcome.matched => {
            debug!(kind = %kind, etag = %outcome.etag, "ETag matches, responding with 304");
            StatusCode::NOT_MODIFIED.into_response()
        }
        _ => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            envelope(kind, body),
        )
            .into_response(),
    };

    let response_headers = response.headers_mut();
    if let Some(cache_control) = endpoint.cache.cache_control() {
        response_headers.insert(header::CACHE_CONTROL, cache_control.clone());
    }
    if let Some(outcome) = outcome {
        match HeaderValue::from_str(&outcome.etag) {
            Ok(etag) => {
                response_headers.insert(header::ETAG, etag);
            }
            Err(err) => warn!(error = %err, "Invalid ETag value"),
        }
    }

    response
}

/// `{"<key>":<body>}`, with `body` already serialized
fn envelope(kind: ResourceKind, body: &[u8]) -> Bytes {
    let key = kind.envelope_key();
    let mut out = Vec::with_capacity(body.len() + key.len() + 5);
    out.extend_from_slice(b"{\"");
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(b"\":");
    out.extend_from_slice(body);
    out.push(b'}');
    Bytes::from(out)
}

/// Manifest endpoint (`/manifest.json` and `/{userData}/manifest.json`)
///
/// Without a manifest callback the pre-serialized bodies are returned.
/// With user data present the manifest always reports
/// `configurationRequired: false`.
pub async fn manifest(state: AppState, user_data_segment: Option<String>) -> Response {
    let response = match render_manifest(&state, user_data_segment.as_deref()) {
        Ok(response) => response,
        Err(err) => {
            debug!(error = %err, "Manifest request rejected");
            err.into_response()
        }
    };

    state.metrics.record_response(response.status());
    response
}

fn render_manifest(state: &AppState, user_data_segment: Option<&str>) -> Result<Response, ApiError> {
    let manifest_state = &state.manifest;
    let user_data = match user_data_segment {
        Some(segment) => state
            .codec
            .decode(segment)
            .inspect_err(|err| warn!(error = %err, "Couldn't decode user data for manifest"))?,
        None => UserData::None,
    };
    let configured = user_data_segment.is_some();

    let body = match &manifest_state.callback {
        None if configured => manifest_state.configured.clone(),
        None => manifest_state.canonical.clone(),
        Some(callback) => {
            let mut manifest = manifest_state.manifest.clone();
            let status = callback(&mut manifest, &user_data);
            if status.as_u16() >= 400 {
                return Err(ApiError::Status(status));
            }
            if configured {
                manifest.behavior_hints.configuration_required = false;
            }
            Bytes::from(serde_json::to_vec(&manifest)?)
        }
    };

    Ok(([(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))], body).into_response())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub requests: MetricsSnapshot,
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        requests: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
