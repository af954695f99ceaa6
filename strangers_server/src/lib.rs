//! WASI-compatible server that pairs anonymous strangers and relays their chat and calls
//!
//! Connected participants wait in a FIFO queue and are matched two at a time into exclusive
//! sessions. Within a session the server relays chat messages (reporting `sent`, `delivered`
//! and `seen` back to the author), typing indicators, and the signaling handshake for a direct
//! WebRTC call. Either member can move on with `findNext`; the other is told the stranger left.
//!
//! # Protocol
//!
//! The event channel is carried over HTTP long-polling:
//!
//! - **GET /poll** - Connect; returns a fresh peer id and first events
//! - **GET /poll?peer_id={id}** - Poll for events
//! - **POST /signal** - Send one request (X-Peer-Id header required)
//! - **POST /leave** - Disconnect (X-Peer-Id header required)
//! - **GET /health** - Health check
//!
//! A long-poll client has no socket whose closing the server can see. A participant that neither
//! polls nor signals for `PEER_TIMEOUT_SECS` (45 by default) is disconnected on the next
//! request the server handles, and its counterpart is told the stranger left.
//!
//! ## Response Format (server → client)
//!
//! ```json
//! {"peer_id": "<uuid>", "events": [{"event": "waiting", "message": "Looking for a stranger..."}]}
//! ```
//!
//! ## Requests (client → server)
//!
//! ```json
//! {"event": "chatMessage", "message": "hi", "type": "text", "userName": "ana"}
//! {"event": "webrtcAnswer", "answer": {"type": "answer", "sdp": "..."}, "to": "<uuid>"}
//! ```
//!
//! # Example
//!
//! ```bash
//! # Start the server
//! wasmtime serve -S common --env FRONTEND_URL=http://localhost:3000 \
//!   --addr 127.0.0.1:3001 strangers-server-wasm.wasm
//!
//! # Connect
//! curl http://127.0.0.1:3001/poll
//!
//! # Say hello to whoever you were paired with
//! curl -X POST -H "X-Peer-Id: <your-id>" -H "Content-Type: application/json" \
//!   -d '{"event":"chatMessage","message":"hello","type":"text"}' \
//!   http://127.0.0.1:3001/signal
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handler;
pub mod state;

pub use config::ServerConfig;
pub use error::{ClientRequestError, ConfigError, SignalingError};
pub use handler::handle_request;
pub use state::{Lobby, ParticipantState, ParticipantStatus, ServerState, Session};
