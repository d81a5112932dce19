//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed domain entities for the fleet registry,
//! ticket workflow, and user directory, plus the services that drive them.
//! Keep invariants and serialisation contracts (serde) in each type's
//! Rustdoc; inbound adapters translate HTTP payloads into these types and
//! never reimplement their rules.

pub mod auth;
pub mod authz;
pub mod device;
pub mod device_service;
pub mod error;
pub mod identity_service;
pub mod ports;
pub mod report_service;
pub mod ticket;
pub mod ticket_service;
pub mod user;
pub mod user_service;

pub use self::auth::{Actor, LoginCredentials, LoginValidationError, SessionClaims};
pub use self::authz::{TicketAction, UserEditScope, UserListScope};
pub use self::device::{
    Device, DeviceId, DeviceIdentifier, DeviceStatus, DeviceValidationError, Location, NewDevice,
};
pub use self::device_service::DeviceService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity_service::{AuthenticatedUser, IdentityService};
pub use self::report_service::{
    DeviceTypeCount, DurationReport, ReportService, TicketStatusCount, WorkloadReport, WorkloadRow,
};
pub use self::ticket::{
    DeviceConditionLabel, ErrorType, NewTicket, Reply, Ticket, TicketId, TicketStatus,
    TicketValidationError,
};
pub use self::ticket_service::{CreateTicket, TicketService};
pub use self::user::{
    DeviceType, EmailAddress, NewUser, Role, User, UserId, UserValidationError,
    device_types_overlap,
};
pub use self::user_service::{CreateUser, UpdateUser, UserService};

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
