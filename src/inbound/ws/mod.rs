//! WebSocket inbound adapter for realtime notification delivery.
//!
//! Responsibilities:
//! - authenticate upgrade requests against the session cookie
//! - initialise the per-connection session task
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{get, HttpRequest, HttpResponse};
use tracing::error;

use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

pub use state::ConnectionRegistry;

/// Handle WebSocket upgrade for the `/ws` endpoint.
///
/// The upgrade itself is the authentication boundary: unauthenticated
/// requests never reach the registry.
#[get("/ws")]
pub async fn ws_entry(
    registry: web::Data<ConnectionRegistry>,
    session_ctx: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let claims = session_ctx.require_claims()?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream).map_err(|err| {
        error!(error = %err, "WebSocket upgrade failed");
        err
    })?;

    actix_web::rt::spawn(session::handle_ws_session(
        registry.into_inner(),
        claims.user_id,
        session,
        msg_stream,
    ));

    Ok(response)
}
