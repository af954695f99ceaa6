//! HTTP long-polling handlers for the stranger signaling server
//!
//! Each participant's event channel is carried over plain HTTP: a `GET /poll` connects and
//! later polls drain the participant's outbox, `POST /signal` carries one request, and
//! `POST /leave` disconnects. Every request first disconnects participants that have gone
//! silent for longer than the configured peer timeout.

use crate::error::{ClientRequestError, SignalingError};
use crate::state::ServerState;
use chrono::Utc;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_LENGTH, CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use strangers_protocol::{ClientRequest, PeerId, PollResponse};
use tracing::{debug, error, warn};
use wstd::http::{Body, BodyExt, Request, Response};

/// Header naming the participant on `POST` requests
pub const PEER_ID_HEADER: &str = "x-peer-id";

const INFO_PAGE: &str = "Stranger Signaling Server (Long-Polling)\n\
     \n\
     Endpoints:\n\
     - GET /health - Health check\n\
     - GET /poll - Connect; returns your peer_id and first events\n\
     - GET /poll?peer_id={id} - Poll for new events\n\
     - POST /signal - Send one event (X-Peer-Id header required)\n\
     - POST /leave - Disconnect (X-Peer-Id header required)\n\
     \n\
     Response format: {\"peer_id\": \"uuid\", \"events\": [...]}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Preflight,
    Health,
    Poll,
    Signal,
    Leave,
    Info,
    NotFound,
}

fn route(method: &Method, path: &str) -> Route {
    if *method == Method::OPTIONS {
        return Route::Preflight;
    }
    match (method.as_str(), path) {
        ("GET", "/health") => Route::Health,
        ("GET", "/poll") => Route::Poll,
        ("POST", "/signal") => Route::Signal,
        ("POST", "/leave") => Route::Leave,
        ("GET", "/") => Route::Info,
        _ => Route::NotFound,
    }
}

/// Get query parameter from URI
fn get_query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let k = parts.next()?;
        let v = parts.next()?;
        if k == key { Some(v) } else { None }
    })
}

fn header_peer_id(headers: &HeaderMap) -> Option<PeerId> {
    headers
        .get(PEER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Builds responses carrying the configured CORS headers
struct Responder {
    origin: Option<HeaderValue>,
}

impl Responder {
    fn new(state: &ServerState) -> Self {
        let origin = HeaderValue::from_str(&state.config().allowed_origin).ok();
        if origin.is_none() {
            warn!(
                origin = %state.config().allowed_origin,
                "allowed origin is not a valid header value, omitting CORS headers"
            );
        }
        Self { origin }
    }

    fn respond(
        &self,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: Body,
    ) -> Response<Body> {
        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        if let Some(origin) = &self.origin {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(
                ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }

    fn text(&self, status: StatusCode, body: impl Into<String>) -> Response<Body> {
        self.respond(status, Some("text/plain"), Body::from(body.into()))
    }

    fn json(&self, body: String) -> Response<Body> {
        self.respond(StatusCode::OK, Some("application/json"), Body::from(body))
    }

    /// Handle CORS preflight
    fn preflight(&self) -> Response<Body> {
        let mut response = self.respond(StatusCode::NO_CONTENT, None, Body::empty());
        let headers = response.headers_mut();
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type, x-peer-id"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
        response
    }
}

/// Connect a new participant or drain an existing one's events
fn handle_poll(
    peer_id: Option<PeerId>,
    state: &ServerState,
    responder: &Responder,
) -> Response<Body> {
    let (peer_id, events) = state.connect_or_poll(peer_id);
    let response = PollResponse { peer_id, events };

    match serde_json::to_string(&response).map_err(SignalingError::from) {
        Ok(body) => responder.json(body),
        Err(e) => {
            // Events are already drained and are lost.
            error!(peer_id = %peer_id, error = %e, "failed to encode poll response");
            responder.text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Handle a signal POST request
async fn handle_signal(
    request: Request<Body>,
    state: &ServerState,
    responder: &Responder,
) -> Response<Body> {
    let Some(sender) = header_peer_id(request.headers()) else {
        return responder.text(
            StatusCode::BAD_REQUEST,
            ClientRequestError::MissingPeerId.to_string(),
        );
    };

    let limit = state.config().max_payload_bytes;
    if let Some(size) = content_length(request.headers()).filter(|size| *size > limit) {
        return payload_too_large(sender, size, limit, state, responder);
    }

    // Chunked uploads carry no Content-Length, so the limit is enforced while reading too
    let contents = match read_body(request.into_body(), limit).await {
        Ok(contents) => contents,
        Err(ClientRequestError::PayloadTooLarge { received, limit }) => {
            return payload_too_large(sender, received, limit, state, responder);
        }
        Err(e) => return responder.text(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let body_str = match std::str::from_utf8(&contents) {
        Ok(s) => s,
        Err(e) => {
            let e = ClientRequestError::Body(e.to_string());
            return responder.text(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let signal_request = match body_str.parse::<ClientRequest>() {
        Ok(req) => req,
        Err(e) => {
            let e = ClientRequestError::from(e);
            debug!(peer_id = %sender, error = %e, "rejecting request");
            return responder.text(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.handle(sender, signal_request) {
        Ok(()) => responder.text(StatusCode::OK, "OK"),
        Err(SignalingError::UnknownPeer) => {
            responder.text(StatusCode::NOT_FOUND, "Peer not found")
        }
        Err(e) => responder.text(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Collect a request body, giving up as soon as it grows past `limit` bytes
async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, ClientRequestError> {
    let mut body = body.into_boxed_body();
    let mut contents = Vec::new();
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| ClientRequestError::Body(format!("{e:?}")))?;
        // Trailers carry no payload
        let Ok(data) = frame.into_data() else {
            continue;
        };
        let received = contents.len() + data.len();
        if received > limit {
            return Err(ClientRequestError::PayloadTooLarge { received, limit });
        }
        contents.extend_from_slice(&data);
    }
    Ok(contents)
}

/// An oversized request fails the sender's connection, as a closed socket would
fn payload_too_large(
    sender: PeerId,
    size: usize,
    limit: usize,
    state: &ServerState,
    responder: &Responder,
) -> Response<Body> {
    let e = SignalingError::PayloadTooLarge { size, limit };
    warn!(peer_id = %sender, size, limit, "payload too large, disconnecting");
    state.disconnect(&sender);
    responder.text(StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
}

fn handle_leave(
    request: &Request<Body>,
    state: &ServerState,
    responder: &Responder,
) -> Response<Body> {
    match header_peer_id(request.headers()) {
        Some(id) => {
            state.disconnect(&id);
            responder.text(StatusCode::OK, "OK")
        }
        None => responder.text(
            StatusCode::BAD_REQUEST,
            ClientRequestError::MissingPeerId.to_string(),
        ),
    }
}

/// Handle an HTTP request - main router
pub async fn handle_request(
    request: Request<Body>,
    state: &ServerState,
) -> Result<Response<Body>, wstd::http::Error> {
    let responder = Responder::new(state);
    let method = request.method().clone();
    let uri = request.uri().clone();
    debug!(method = %method, path = uri.path(), "request");

    state.disconnect_silent(Utc::now());

    let response = match route(&method, uri.path()) {
        Route::Preflight => responder.preflight(),
        Route::Health => responder.json(
            serde_json::json!({"status": "ok", "message": "Signaling server is running"})
                .to_string(),
        ),
        Route::Poll => {
            let peer_id = get_query_param(uri.query(), "peer_id").and_then(|s| s.parse().ok());
            handle_poll(peer_id, state, &responder)
        }
        Route::Signal => handle_signal(request, state, &responder).await,
        Route::Leave => handle_leave(&request, state, &responder),
        Route::Info => responder.text(StatusCode::OK, INFO_PAGE),
        Route::NotFound => responder.text(StatusCode::NOT_FOUND, "Not Found"),
    };
    Ok(response)
}
