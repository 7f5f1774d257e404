//! The two wire transports MCP clients can use: Server-Sent Events and a
//! single streamable-HTTP POST endpoint. Both frame the same
//! [`super::handlers::handle_request`] dispatch.

use super::handlers::{handle_request, McpState};
use super::jsonrpc::JsonRpcRequest;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;
use warp::{sse::Event, Filter, Rejection, Reply};

#[derive(Clone, Default)]
struct SseSessions {
    senders: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<String>>>>,
}

impl SseSessions {
    async fn register(&self, id: Uuid, sender: mpsc::UnboundedSender<String>) {
        self.senders.write().await.insert(id, sender);
    }

    async fn unregister(&self, id: &Uuid) {
        self.senders.write().await.remove(id);
    }

    async fn send(&self, id: &Uuid, payload: String) -> bool {
        match self.senders.read().await.get(id) {
            Some(sender) => sender.send(payload).is_ok(),
            None => false,
        }
    }
}

/// `GET /sse` — opens a long-lived event stream. The first event tells the
/// client where to POST its JSON-RPC requests (including the session id);
/// every response to those requests is delivered back as a `message` event
/// on this same stream.
pub fn sse_route(state: McpState, sessions: SseSessions) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("sse")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and(with_sessions(sessions))
        .map(|_state: McpState, sessions: SseSessions| {
            let session_id = Uuid::new_v4();
            let (tx, rx) = mpsc::unbounded_channel::<String>();
            let sessions_for_register = sessions.clone();
            tokio::spawn(async move {
                sessions_for_register.register(session_id, tx).await;
            });

            let endpoint_event = Event::default()
                .event("endpoint")
                .data(format!("/sse/message?session_id={session_id}"));
            let first = tokio_stream::once(Ok::<_, Infallible>(endpoint_event));
            let rest = UnboundedReceiverStream::new(rx)
                .map(|payload| Ok::<_, Infallible>(Event::default().event("message").data(payload)));

            warp::sse::reply(warp::sse::keep_alive().stream(first.chain(rest)))
        })
}

/// `POST /sse/message?session_id=...` — submits one JSON-RPC request for
/// the session opened at `GET /sse`; the response is delivered over that
/// session's event stream, not in this call's own HTTP response.
pub fn sse_message_route(
    state: McpState,
    sessions: SseSessions,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    #[derive(serde::Deserialize)]
    struct Query {
        session_id: Uuid,
    }

    warp::path("sse")
        .and(warp::path("message"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::query::<Query>())
        .and(warp::body::json())
        .and(with_state(state))
        .and(with_sessions(sessions))
        .and_then(
            |query: Query, request: JsonRpcRequest, state: McpState, sessions: SseSessions| async move {
                let response = handle_request(&state, request).await;
                let payload = serde_json::to_string(&response).unwrap_or_default();
                let delivered = sessions.send(&query.session_id, payload).await;
                if !delivered {
                    return Err(warp::reject::not_found());
                }
                Ok::<_, Rejection>(warp::reply::json(&serde_json::json!({ "accepted": true })))
            },
        )
}

/// `POST /` — one JSON-RPC request per call, one JSON-RPC response back,
/// no session state required.
pub fn streamable_http_route(state: McpState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|request: JsonRpcRequest, state: McpState| async move {
            let response = handle_request(&state, request).await;
            Ok::<_, Rejection>(warp::reply::json(&response))
        })
}

fn with_state(state: McpState) -> impl Filter<Extract = (McpState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_sessions(sessions: SseSessions) -> impl Filter<Extract = (SseSessions,), Error = Infallible> + Clone {
    warp::any().map(move || sessions.clone())
}

pub fn routes(state: McpState) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let sessions = SseSessions::default();
    sse_route(state.clone(), sessions.clone())
        .or(sse_message_route(state.clone(), sessions))
        .or(streamable_http_route(state))
}
