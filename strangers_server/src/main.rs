//! WASI HTTP server entry point for the long-polling stranger signaling server
//!
//! This module provides the main entry point when running as a WASI HTTP component
//! using `wasmtime serve`.

use std::cell::RefCell;
use strangers_server::{ServerConfig, ServerState, handle_request};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wstd::http::{Body, Request, Response};

// Thread-local state for the server (WASI is single-threaded)
thread_local! {
    static STATE: RefCell<Option<ServerState>> = const { RefCell::new(None) };
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn get_or_init_state() -> ServerState {
    STATE.with(|s| {
        s.borrow_mut()
            .get_or_insert_with(|| {
                let (config, config_error) = match ServerConfig::from_env() {
                    Ok(config) => (config, None),
                    Err(e) => (ServerConfig::default(), Some(e)),
                };
                init_tracing(&config.log_filter);
                if let Some(e) = config_error {
                    warn!(error = %e, "invalid configuration, using defaults");
                }
                info!(
                    allowed_origin = %config.allowed_origin,
                    max_payload_bytes = config.max_payload_bytes,
                    peer_timeout_secs = config.peer_timeout_secs,
                    "signaling server state initialized"
                );
                ServerState::with_config(config)
            })
            .clone()
    })
}

/// The main HTTP handler for WASI
///
/// This function is called by the WASI runtime for each incoming HTTP request.
#[wstd::http_server]
async fn main(request: Request<Body>) -> Result<Response<Body>, wstd::http::Error> {
    let state = get_or_init_state();
    handle_request(request, &state).await
}
