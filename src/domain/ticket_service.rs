//! Ticket workflow engine: creation, the status machine, and conversations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::domain::auth::Actor;
use crate::domain::authz::{self, TicketAction};
use crate::domain::device::{DeviceId, DeviceStatus};
use crate::domain::error::Error;
use crate::domain::identity_service::map_repository_error;
use crate::domain::ports::{
    BlobStore, BlobStoreError, DeviceRepository, FileUpload, Notifier, TicketRepository,
    UserRepository,
};
use crate::domain::ticket::{
    DeviceConditionLabel, ErrorType, NewTicket, Reply, Ticket, TicketId, TicketStatus,
};
use crate::domain::user::{DeviceType, Role, UserId};

fn map_blob_error(error: BlobStoreError) -> Error {
    match error {
        BlobStoreError::TooLarge { .. } | BlobStoreError::UnsupportedType { .. } => {
            Error::invalid_request(error.to_string())
        }
        BlobStoreError::Storage { message } => {
            Error::service_unavailable(format!("attachment storage failed: {message}"))
        }
    }
}

fn map_validation(err: crate::domain::ticket::TicketValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn status_payload(ticket: &Ticket) -> serde_json::Value {
    json!({ "id": ticket.id(), "status": ticket.status() })
}

/// Inputs for opening a ticket through the reporting pathway.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub device: Option<DeviceId>,
    pub manual_device: Option<String>,
    pub error_type: ErrorType,
    pub manual_error_type: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub attachment: Option<FileUpload>,
    pub condition_label: Option<DeviceConditionLabel>,
}

/// The workflow engine over tickets, devices, and the conversation log.
#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    devices: Arc<dyn DeviceRepository>,
    users: Arc<dyn UserRepository>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        devices: Arc<dyn DeviceRepository>,
        users: Arc<dyn UserRepository>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tickets,
            devices,
            users,
            blobs,
            notifier,
        }
    }

    /// Open a ticket, storing the attachment first so a failed upload never
    /// leaves a ticket without its file.
    pub async fn create(&self, actor: &Actor, request: CreateTicket) -> Result<Ticket, Error> {
        authz::can_create_ticket(actor)?;

        if let Some(device_id) = &request.device {
            let device = self
                .devices
                .find_by_id(device_id)
                .await
                .map_err(map_repository_error)?
                .ok_or_else(|| Error::not_found("device not found"))?;
            if !authz::device_visible(actor, &device) {
                return Err(Error::forbidden(
                    "you may not report tickets for this device",
                ));
            }
        }

        let file = match request.attachment {
            Some(upload) => Some(self.blobs.store(upload).await.map_err(map_blob_error)?),
            None => None,
        };

        let ticket = Ticket::create(NewTicket {
            device: request.device,
            manual_device: request.manual_device,
            error_type: request.error_type,
            manual_error_type: request.manual_error_type,
            description: request.description,
            tags: request.tags,
            file,
            creator: actor.id,
            condition_label: request.condition_label,
        })
        .map_err(map_validation)?;

        self.tickets
            .insert(&ticket)
            .await
            .map_err(map_repository_error)?;
        info!(ticket_id = %ticket.id(), creator = %actor.id, "ticket opened");
        self.notifier
            .broadcast_all("new-ticket", status_payload(&ticket))
            .await;
        Ok(ticket)
    }

    /// List the tickets visible to the actor, optionally narrowed to one
    /// workflow status.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, Error> {
        let all = self.tickets.list().await.map_err(map_repository_error)?;
        let creator_types = self.creator_type_index(actor, &all).await?;
        Ok(all
            .into_iter()
            .filter(|t| {
                status.map_or(true, |s| t.status() == s)
                    && self.visible(actor, t, &creator_types)
            })
            .collect())
    }

    /// Fetch one ticket, subject to the same visibility as listing.
    pub async fn get(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, Error> {
        let ticket = self.find_required(id).await?;
        self.require_visible(actor, &ticket).await?;
        Ok(ticket)
    }

    /// Legacy single-field expert reply; moves the ticket to `answered` and
    /// assigns the expert when none is assigned yet.
    pub async fn reply(&self, actor: &Actor, id: &TicketId, text: String) -> Result<Ticket, Error> {
        let mut ticket = self.find_required(id).await?;
        authz::can_transition(actor, &ticket, TicketAction::Reply)?;
        self.require_open(&ticket)?;
        let text = text.trim().to_owned();
        if text.is_empty() {
            return Err(Error::invalid_request("reply must not be empty"));
        }
        ticket.record_reply(actor.id, text);
        self.persist(&ticket).await?;
        self.notifier
            .send_to_user(&ticket.creator(), "reply-ticket", status_payload(&ticket))
            .await;
        Ok(ticket)
    }

    /// Expert-driven status changes: pending, resolved, rejected.
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<Ticket, Error> {
        let action = match status {
            TicketStatus::Pending => TicketAction::SetPending,
            TicketStatus::Resolved => TicketAction::SetResolved,
            TicketStatus::Rejected => TicketAction::SetRejected,
            _ => {
                return Err(Error::invalid_request(
                    "only pending, resolved, and rejected may be set directly",
                ))
            }
        };
        let mut ticket = self.find_required(id).await?;
        authz::can_transition(actor, &ticket, action)?;
        self.require_open(&ticket)?;
        ticket.set_status(status);
        self.persist(&ticket).await?;
        info!(ticket_id = %id, status = ?status, "ticket status changed");
        self.notifier
            .broadcast_all("status-changed", status_payload(&ticket))
            .await;
        Ok(ticket)
    }

    /// Send a cash replenisher to an ATM: only from `pending`, only on
    /// tickets linked to an ATM device.
    pub async fn dispatch_replenisher(
        &self,
        actor: &Actor,
        id: &TicketId,
    ) -> Result<Ticket, Error> {
        let mut ticket = self.find_required(id).await?;
        authz::can_transition(actor, &ticket, TicketAction::Dispatch)?;
        if ticket.status() != TicketStatus::Pending {
            return Err(Error::conflict(
                "a replenisher can only be dispatched for a pending ticket",
            ));
        }
        let device_id = ticket
            .device()
            .ok_or_else(|| Error::conflict("this ticket is not linked to a device"))?;
        let device = self
            .devices
            .find_by_id(&device_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("device not found"))?;
        if device.device_type() != DeviceType::Atm {
            return Err(Error::conflict("replenishers are dispatched to ATMs only"));
        }
        ticket.set_status(TicketStatus::DispatchRequested);
        self.persist(&ticket).await?;
        info!(ticket_id = %id, device_id = %device_id, "replenisher dispatched");
        self.notifier
            .broadcast_all("status-changed", status_payload(&ticket))
            .await;
        Ok(ticket)
    }

    /// Creator confirmation, closing the loop on resolved work. Confirming a
    /// dispatch additionally marks the linked ATM as in service.
    pub async fn confirm(&self, actor: &Actor, id: &TicketId) -> Result<Ticket, Error> {
        let mut ticket = self.find_required(id).await?;
        authz::can_transition(actor, &ticket, TicketAction::Confirm)?;
        let prior = ticket.status();
        let confirmable = matches!(
            prior,
            TicketStatus::Resolved | TicketStatus::DispatchRequested
        ) || ticket.condition_label().is_some();
        if !confirmable {
            return Err(Error::conflict("this ticket is not awaiting confirmation"));
        }
        ticket.set_status(TicketStatus::Confirmed);
        self.persist(&ticket).await?;

        if prior == TicketStatus::DispatchRequested {
            if let Some(device_id) = ticket.device() {
                self.mark_device_in_service(&device_id).await;
            }
        }

        info!(ticket_id = %id, "ticket confirmed");
        self.notifier
            .broadcast_all("confirm-ticket", status_payload(&ticket))
            .await;
        Ok(ticket)
    }

    /// Read the conversation log.
    pub async fn messages(&self, actor: &Actor, id: &TicketId) -> Result<Vec<Reply>, Error> {
        let ticket = self.get(actor, id).await?;
        Ok(ticket.replies().to_vec())
    }

    /// Append a conversation entry, honouring the first-expert lock, and
    /// notify both ends of the thread.
    pub async fn add_message(
        &self,
        actor: &Actor,
        id: &TicketId,
        message: Option<String>,
        attachment: Option<FileUpload>,
    ) -> Result<Ticket, Error> {
        let mut ticket = self.find_required(id).await?;
        authz::can_send_ticket_message(actor, &ticket)?;

        let file = match attachment {
            Some(upload) => Some(self.blobs.store(upload).await.map_err(map_blob_error)?),
            None => None,
        };
        let reply = Reply::new(actor.id, message, file).map_err(map_validation)?;
        ticket.push_reply(reply, actor.role == Role::Expert);
        self.persist(&ticket).await?;

        let payload = status_payload(&ticket);
        self.notifier
            .send_to_user(&ticket.creator(), "ticket-reply", payload.clone())
            .await;
        if let Some(expert) = ticket.locked_expert() {
            if expert != ticket.creator() {
                self.notifier
                    .send_to_user(&expert, "ticket-reply", payload)
                    .await;
            }
        }
        Ok(ticket)
    }

    /// Confirmed tickets accept no further transitions or legacy replies.
    fn require_open(&self, ticket: &Ticket) -> Result<(), Error> {
        if ticket.status() == TicketStatus::Confirmed {
            return Err(Error::conflict("this ticket has already been confirmed"));
        }
        Ok(())
    }

    async fn mark_device_in_service(&self, device_id: &DeviceId) {
        // Best-effort side effect: a missing or failing device write must not
        // undo the confirmation.
        match self.devices.find_by_id(device_id).await {
            Ok(Some(mut device)) => {
                if device.cash_status() != Some(DeviceStatus::InService) {
                    device.set_cash_status(DeviceStatus::InService);
                    if let Err(err) = self.devices.update(&device).await {
                        warn!(device_id = %device_id, error = %err, "in-service write failed");
                    }
                }
            }
            Ok(None) => warn!(device_id = %device_id, "confirmed dispatch for missing device"),
            Err(err) => warn!(device_id = %device_id, error = %err, "device load failed"),
        }
    }

    async fn persist(&self, ticket: &Ticket) -> Result<(), Error> {
        self.tickets
            .update(ticket)
            .await
            .map_err(map_repository_error)
    }

    async fn find_required(&self, id: &TicketId) -> Result<Ticket, Error> {
        self.tickets
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("ticket not found"))
    }

    async fn require_visible(&self, actor: &Actor, ticket: &Ticket) -> Result<(), Error> {
        let creator_types = self.creator_types(&ticket.creator()).await?;
        if authz::ticket_visible(actor, ticket, &creator_types) {
            Ok(())
        } else {
            Err(Error::forbidden("you may not view this ticket"))
        }
    }

    fn visible(
        &self,
        actor: &Actor,
        ticket: &Ticket,
        creator_types: &HashMap<UserId, BTreeSet<DeviceType>>,
    ) -> bool {
        static EMPTY: BTreeSet<DeviceType> = BTreeSet::new();
        let types = creator_types.get(&ticket.creator()).unwrap_or(&EMPTY);
        authz::ticket_visible(actor, ticket, types)
    }

    async fn creator_types(&self, creator: &UserId) -> Result<BTreeSet<DeviceType>, Error> {
        Ok(self
            .users
            .find_by_id(creator)
            .await
            .map_err(map_repository_error)?
            .map(|u| u.allowed_device_types().clone())
            .unwrap_or_default())
    }

    /// Build a creator → allowed-types index for list filtering. Only
    /// experts need it; other roles filter on identity alone.
    async fn creator_type_index(
        &self,
        actor: &Actor,
        tickets: &[Ticket],
    ) -> Result<HashMap<UserId, BTreeSet<DeviceType>>, Error> {
        if actor.role != Role::Expert || tickets.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.users.list().await.map_err(map_repository_error)?;
        Ok(users
            .into_iter()
            .map(|u| (u.id(), u.allowed_device_types().clone()))
            .collect())
    }
}

#[cfg(test)]
#[path = "ticket_service_tests.rs"]
mod tests;
