//! Ticket workflow HTTP handlers.
//!
//! ```text
//! GET  /api/tickets            (optional ?status= filter)
//! POST /api/tickets
//! GET  /api/tickets/{id}
//! POST /api/tickets/{id}/reply
//! GET  /api/tickets/{id}/messages
//! POST /api/tickets/{id}/messages
//! POST /api/tickets/{id}/pending
//! POST /api/tickets/{id}/resolved
//! POST /api/tickets/{id}/rejected
//! POST /api/tickets/{id}/dispatch
//! POST /api/tickets/{id}/confirm
//! ```

use actix_web::{get, post, web, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::FileUpload;
use crate::domain::{
    CreateTicket, DeviceConditionLabel, DeviceId, Error, ErrorType, Reply, Ticket, TicketId,
    TicketStatus, UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Response payload for a ticket.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: TicketId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_device: Option<String>,
    pub error_type: ErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_error_type: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub creator: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_label: Option<DeviceConditionLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_expert: Option<UserId>,
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ticket> for TicketResponse {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id(),
            device: ticket.device(),
            manual_device: ticket.manual_device().map(str::to_owned),
            error_type: ticket.error_type().clone(),
            manual_error_type: ticket.manual_error_type().map(str::to_owned),
            description: ticket.description().to_owned(),
            tags: ticket.tags().to_vec(),
            file: ticket.file().map(str::to_owned),
            creator: ticket.creator(),
            expert: ticket.expert(),
            reply: ticket.reply().map(str::to_owned),
            status: ticket.status(),
            condition_label: ticket.condition_label(),
            locked_expert: ticket.locked_expert(),
            replies: ticket.replies().to_vec(),
            created_at: ticket.created_at(),
            updated_at: ticket.updated_at(),
        }
    }
}

/// An attachment shipped inline as base64.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRequest {
    pub file_name: String,
    pub content_base64: String,
}

impl AttachmentRequest {
    fn into_upload(self) -> Result<FileUpload, Error> {
        let bytes = BASE64
            .decode(self.content_base64.as_bytes())
            .map_err(|_| Error::invalid_request("attachment content must be valid base64"))?;
        Ok(FileUpload {
            original_name: self.file_name,
            bytes,
        })
    }
}

fn decode_attachment(attachment: Option<AttachmentRequest>) -> Result<Option<FileUpload>, Error> {
    attachment.map(AttachmentRequest::into_upload).transpose()
}

/// Request payload for opening a ticket.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub device: Option<Uuid>,
    pub manual_device: Option<String>,
    pub error_type: String,
    pub manual_error_type: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub attachment: Option<AttachmentRequest>,
    pub condition_label: Option<DeviceConditionLabel>,
}

/// Request payload for the single-field expert reply.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub text: String,
}

/// Request payload for a conversation entry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub message: Option<String>,
    pub attachment: Option<AttachmentRequest>,
}

/// Optional status filter for ticket listings.
#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tickets)
        .service(create_ticket)
        .service(get_ticket)
        .service(reply_ticket)
        .service(list_messages)
        .service(add_message)
        .service(set_pending)
        .service(set_resolved)
        .service(set_rejected)
        .service(dispatch_replenisher)
        .service(confirm_ticket);
}

/// List the tickets visible to the requester.
#[utoipa::path(
    get,
    path = "/api/tickets",
    params(("status" = Option<String>, Query, description = "Workflow status filter")),
    responses(
        (status = 200, description = "Visible tickets", body = [TicketResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTickets"
)]
#[get("/tickets")]
pub async fn list_tickets(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListTicketsQuery>,
) -> ApiResult<web::Json<Vec<TicketResponse>>> {
    let actor = session.actor(&state.identity).await?;
    let tickets = state.tickets.list(&actor, query.into_inner().status).await?;
    Ok(web::Json(tickets.iter().map(TicketResponse::from).collect()))
}

/// Open a ticket.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = TicketResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Linked device not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateTicketRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.actor(&state.identity).await?;
    let payload = payload.into_inner();
    let request = CreateTicket {
        device: payload.device.map(DeviceId::from_uuid),
        manual_device: payload.manual_device,
        error_type: ErrorType::new(&payload.error_type)
            .map_err(|err| Error::invalid_request(err.to_string()))?,
        manual_error_type: payload.manual_error_type,
        description: payload.description,
        tags: payload.tags,
        attachment: decode_attachment(payload.attachment)?,
        condition_label: payload.condition_label,
    };
    let ticket = state.tickets.create(&actor, request).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(&ticket)))
}

/// Fetch one ticket.
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let ticket = state.tickets.get(&actor, &id).await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Record the single-field expert reply, moving the ticket to `answered`.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/reply",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Answered ticket", body = TicketResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Ticket already confirmed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "replyTicket"
)]
#[post("/tickets/{id}/reply")]
pub async fn reply_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<ReplyRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let ticket = state
        .tickets
        .reply(&actor, &id, payload.into_inner().text)
        .await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Read the conversation log.
#[utoipa::path(
    get,
    path = "/api/tickets/{id}/messages",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Conversation entries", body = [Reply]),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTicketMessages"
)]
#[get("/tickets/{id}/messages")]
pub async fn list_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<Reply>>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let replies = state.tickets.messages(&actor, &id).await?;
    Ok(web::Json(replies))
}

/// Append a conversation entry.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/messages",
    params(("id" = Uuid, Path, description = "Ticket id")),
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Updated ticket", body = TicketResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "addTicketMessage"
)]
#[post("/tickets/{id}/messages")]
pub async fn add_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<MessageRequest>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let payload = payload.into_inner();
    let ticket = state
        .tickets
        .add_message(
            &actor,
            &id,
            payload.message,
            decode_attachment(payload.attachment)?,
        )
        .await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

async fn transition(
    state: &HttpState,
    session: &SessionContext,
    id: Uuid,
    status: TicketStatus,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(id);
    let ticket = state.tickets.set_status(&actor, &id, status).await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Move a ticket to `pending`. Expert-only.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/pending",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Pending ticket", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Ticket already confirmed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "setTicketPending"
)]
#[post("/tickets/{id}/pending")]
pub async fn set_pending(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    transition(&state, &session, path.into_inner(), TicketStatus::Pending).await
}

/// Move a ticket to `resolved`. Expert-only.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/resolved",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Resolved ticket", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Ticket already confirmed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "setTicketResolved"
)]
#[post("/tickets/{id}/resolved")]
pub async fn set_resolved(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    transition(&state, &session, path.into_inner(), TicketStatus::Resolved).await
}

/// Move a ticket to `rejected`. Experts and the creator may reject.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/rejected",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Rejected ticket", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Ticket already confirmed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "setTicketRejected"
)]
#[post("/tickets/{id}/rejected")]
pub async fn set_rejected(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    transition(&state, &session, path.into_inner(), TicketStatus::Rejected).await
}

/// Dispatch a cash replenisher for a pending ATM ticket. Expert-only.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/dispatch",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Dispatch requested", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Not a pending ATM ticket", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "dispatchReplenisher"
)]
#[post("/tickets/{id}/dispatch")]
pub async fn dispatch_replenisher(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let ticket = state.tickets.dispatch_replenisher(&actor, &id).await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}

/// Confirm resolved work, closing the ticket. Creator-only.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/confirm",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Confirmed ticket", body = TicketResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Not awaiting confirmation", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "confirmTicket"
)]
#[post("/tickets/{id}/confirm")]
pub async fn confirm_ticket(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<TicketResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = TicketId::from_uuid(path.into_inner());
    let ticket = state.tickets.confirm(&actor, &id).await?;
    Ok(web::Json(TicketResponse::from(&ticket)))
}
