//! Ticket model: the workflow status machine's data side.
//!
//! The historic store overloaded one status string with both workflow states
//! and natural-language device-condition labels. Here they are two orthogonal
//! values: [`TicketStatus`] drives the state machine, while
//! [`DeviceConditionLabel`] is metadata on tickets raised from the
//! device-status pathway.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::device::DeviceId;
use crate::domain::user::UserId;

/// Stable ticket identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, example = "5f1b7114-9c31-4b61-b0f7-6a3c5a1f9d2e")]
pub struct TicketId(Uuid);

impl TicketId {
    /// Generate a new random [`TicketId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Workflow state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Pending,
    Answered,
    Resolved,
    Confirmed,
    Rejected,
    /// A cash replenisher has been sent to an ATM, pending creator
    /// confirmation.
    DispatchRequested,
}

/// Device-condition label carried by tickets raised from the device-status
/// pathway. These have no engine-driven transitions beyond creator
/// confirm/reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceConditionLabel {
    Active,
    NeedsService,
    Offline,
    InService,
    NeedsReplenishment,
    NeedsRoll,
}

/// Validation errors returned by the ticket constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketValidationError {
    InvalidErrorType,
    MissingManualErrorType,
    EmptyDescription,
    EmptyReplyBody,
}

impl fmt::Display for TicketValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidErrorType => {
                write!(f, "error type must be one of error1..error99 or manual")
            }
            Self::MissingManualErrorType => {
                write!(f, "manual error type is required when error type is manual")
            }
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::EmptyReplyBody => write!(f, "a reply requires a message or a file"),
        }
    }
}

impl std::error::Error for TicketValidationError {}

/// Enumerated error code (`error1`..`error99`) or `manual`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "error12")]
pub struct ErrorType(String);

impl ErrorType {
    /// Validate an error-type code.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TicketValidationError> {
        let raw = raw.as_ref().trim();
        if raw == "manual" {
            return Ok(Self(raw.to_owned()));
        }
        let number = raw
            .strip_prefix("error")
            .and_then(|n| n.parse::<u8>().ok());
        match number {
            // Require the canonical rendering so codes like `error07` or
            // `error+7` are rejected even though they parse to valid numbers.
            Some(n) if (1..=99).contains(&n) && raw == format!("error{n}") => {
                Ok(Self(raw.to_owned()))
            }
            _ => Err(TicketValidationError::InvalidErrorType),
        }
    }

    /// Whether this is the free-text `manual` code.
    pub fn is_manual(&self) -> bool {
        self.0 == "manual"
    }
}

impl AsRef<str> for ErrorType {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<ErrorType> for String {
    fn from(value: ErrorType) -> Self {
        value.0
    }
}

impl TryFrom<String> for ErrorType {
    type Error = TicketValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A single conversation entry.
///
/// ## Invariants
/// - At least one of `message`/`file` is present (enforced by
///   [`Reply::new`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub sender: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reply {
    /// Build a reply, requiring a non-blank message or a file reference.
    pub fn new(
        sender: UserId,
        message: Option<String>,
        file: Option<String>,
    ) -> Result<Self, TicketValidationError> {
        let message = message.map(|m| m.trim().to_owned()).filter(|m| !m.is_empty());
        if message.is_none() && file.is_none() {
            return Err(TicketValidationError::EmptyReplyBody);
        }
        Ok(Self {
            sender,
            message,
            file,
            created_at: Utc::now(),
        })
    }
}

/// Inputs for opening a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub device: Option<DeviceId>,
    pub manual_device: Option<String>,
    pub error_type: ErrorType,
    pub manual_error_type: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub file: Option<String>,
    pub creator: UserId,
    pub condition_label: Option<DeviceConditionLabel>,
}

/// Problem report raised against a device.
///
/// ## Invariants
/// - `creator` is immutable after creation.
/// - `replies` is append-only.
/// - `locked_expert` is written exactly once, on the first expert message.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    id: TicketId,
    device: Option<DeviceId>,
    manual_device: Option<String>,
    error_type: ErrorType,
    manual_error_type: Option<String>,
    description: String,
    tags: Vec<String>,
    file: Option<String>,
    creator: UserId,
    expert: Option<UserId>,
    reply: Option<String>,
    status: TicketStatus,
    condition_label: Option<DeviceConditionLabel>,
    locked_expert: Option<UserId>,
    replies: Vec<Reply>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a ticket in the `New` state with a fresh id and timestamps.
    pub fn create(draft: NewTicket) -> Result<Self, TicketValidationError> {
        let description = draft.description.trim().to_owned();
        if description.is_empty() {
            return Err(TicketValidationError::EmptyDescription);
        }
        if draft.error_type.is_manual()
            && draft
                .manual_error_type
                .as_deref()
                .map_or(true, |v| v.trim().is_empty())
        {
            return Err(TicketValidationError::MissingManualErrorType);
        }
        let now = Utc::now();
        Ok(Self {
            id: TicketId::random(),
            device: draft.device,
            manual_device: draft.manual_device,
            error_type: draft.error_type,
            manual_error_type: draft.manual_error_type,
            description,
            tags: draft.tags,
            file: draft.file,
            creator: draft.creator,
            expert: None,
            reply: None,
            status: TicketStatus::New,
            condition_label: draft.condition_label,
            locked_expert: None,
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub fn manual_device(&self) -> Option<&str> {
        self.manual_device.as_deref()
    }

    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    pub fn manual_error_type(&self) -> Option<&str> {
        self.manual_error_type.as_deref()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn creator(&self) -> UserId {
        self.creator
    }

    pub fn expert(&self) -> Option<UserId> {
        self.expert
    }

    pub fn reply(&self) -> Option<&str> {
        self.reply.as_deref()
    }

    pub fn status(&self) -> TicketStatus {
        self.status
    }

    pub fn condition_label(&self) -> Option<DeviceConditionLabel> {
        self.condition_label
    }

    pub fn locked_expert(&self) -> Option<UserId> {
        self.locked_expert
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move the ticket to a new workflow state.
    pub fn set_status(&mut self, status: TicketStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record the legacy single-field expert reply, assigning the expert if
    /// none is assigned yet.
    pub fn record_reply(&mut self, expert: UserId, text: String) {
        self.reply = Some(text);
        self.status = TicketStatus::Answered;
        if self.expert.is_none() {
            self.expert = Some(expert);
        }
        self.updated_at = Utc::now();
    }

    /// Append a conversation entry. The first expert message locks the
    /// thread to that expert.
    pub fn push_reply(&mut self, reply: Reply, sender_is_expert: bool) {
        if sender_is_expert && self.locked_expert.is_none() {
            self.locked_expert = Some(reply.sender);
        }
        self.replies.push(reply);
        self.updated_at = Utc::now();
    }
}
