//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every REST path and wire schema into one document.
//! Debug builds expose it at `/api-docs/openapi.json`; release builds compile
//! it in for tooling but do not serve it.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    DeviceConditionLabel, DeviceStatus, DeviceType, DeviceTypeCount, DurationReport, Error,
    ErrorCode, Reply, Role, TicketStatus, TicketStatusCount, WorkloadReport, WorkloadRow,
};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::devices::{DeviceRequest, DeviceResponse, SetStatusRequest};
use crate::inbound::http::tickets::{
    AttachmentRequest, CreateTicketRequest, MessageRequest, ReplyRequest, TicketResponse,
};
use crate::inbound::http::users::{CreateUserRequest, UpdateUserRequest, UserResponse};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "FleetDesk API",
        description = "Ticketing and device inventory for payment-terminal fleets."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::devices::list_devices,
        crate::inbound::http::devices::create_device,
        crate::inbound::http::devices::get_device,
        crate::inbound::http::devices::update_device,
        crate::inbound::http::devices::delete_device,
        crate::inbound::http::devices::set_device_status,
        crate::inbound::http::tickets::list_tickets,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::reply_ticket,
        crate::inbound::http::tickets::list_messages,
        crate::inbound::http::tickets::add_message,
        crate::inbound::http::tickets::set_pending,
        crate::inbound::http::tickets::set_resolved,
        crate::inbound::http::tickets::set_rejected,
        crate::inbound::http::tickets::dispatch_replenisher,
        crate::inbound::http::tickets::confirm_ticket,
        crate::inbound::http::reports::tickets_by_status,
        crate::inbound::http::reports::devices_by_type,
        crate::inbound::http::reports::workload,
        crate::inbound::http::reports::durations,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        DeviceType,
        DeviceStatus,
        TicketStatus,
        DeviceConditionLabel,
        Reply,
        LoginRequest,
        UserResponse,
        CreateUserRequest,
        UpdateUserRequest,
        DeviceResponse,
        DeviceRequest,
        SetStatusRequest,
        TicketResponse,
        CreateTicketRequest,
        AttachmentRequest,
        ReplyRequest,
        MessageRequest,
        TicketStatusCount,
        DeviceTypeCount,
        WorkloadReport,
        WorkloadRow,
        DurationReport,
    )),
    tags(
        (name = "auth", description = "Session login and logout"),
        (name = "users", description = "User directory"),
        (name = "devices", description = "Payment terminal registry"),
        (name = "tickets", description = "Ticket workflow and conversations"),
        (name = "reports", description = "Manager dashboards")
    )
)]
pub struct ApiDoc;
