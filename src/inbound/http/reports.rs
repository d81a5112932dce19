//! Reporting HTTP handlers. Manager-only, read-only.
//!
//! ```text
//! GET /api/reports/tickets
//! GET /api/reports/devices
//! GET /api/reports/performance
//! GET /api/reports/time
//! ```

use actix_web::{get, web};

use crate::domain::{
    DeviceTypeCount, DurationReport, Error, TicketStatusCount, WorkloadReport,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(tickets_by_status)
        .service(devices_by_type)
        .service(workload)
        .service(durations);
}

/// Ticket counts grouped by workflow status.
#[utoipa::path(
    get,
    path = "/api/reports/tickets",
    responses(
        (status = 200, description = "Counts per status", body = [TicketStatusCount]),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "ticketStatusReport"
)]
#[get("/reports/tickets")]
pub async fn tickets_by_status(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TicketStatusCount>>> {
    let actor = session.actor(&state.identity).await?;
    Ok(web::Json(state.reports.tickets_by_status(&actor).await?))
}

/// Device counts grouped by terminal type.
#[utoipa::path(
    get,
    path = "/api/reports/devices",
    responses(
        (status = 200, description = "Counts per device type", body = [DeviceTypeCount]),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "deviceTypeReport"
)]
#[get("/reports/devices")]
pub async fn devices_by_type(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<DeviceTypeCount>>> {
    let actor = session.actor(&state.identity).await?;
    Ok(web::Json(state.reports.devices_by_type(&actor).await?))
}

/// Per-expert answered counts and per-agent created counts.
#[utoipa::path(
    get,
    path = "/api/reports/performance",
    responses(
        (status = 200, description = "Workload rows", body = WorkloadReport),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "workloadReport"
)]
#[get("/reports/performance")]
pub async fn workload(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<WorkloadReport>> {
    let actor = session.actor(&state.identity).await?;
    Ok(web::Json(state.reports.workload(&actor).await?))
}

/// Average creation-to-last-update durations in milliseconds.
#[utoipa::path(
    get,
    path = "/api/reports/time",
    responses(
        (status = 200, description = "Average durations", body = DurationReport),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["reports"],
    operation_id = "durationReport"
)]
#[get("/reports/time")]
pub async fn durations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DurationReport>> {
    let actor = session.actor(&state.identity).await?;
    Ok(web::Json(state.reports.durations(&actor).await?))
}
