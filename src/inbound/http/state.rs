//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use crate::domain::{DeviceService, IdentityService, ReportService, TicketService, UserService};

/// Dependency bundle for HTTP handlers. Each service is cheap to clone;
/// the port adapters behind them are shared through `Arc`.
#[derive(Clone)]
pub struct HttpState {
    pub identity: IdentityService,
    pub users: UserService,
    pub devices: DeviceService,
    pub tickets: TicketService,
    pub reports: ReportService,
}
