//! Device registry HTTP handlers.
//!
//! ```text
//! GET    /api/devices
//! POST   /api/devices
//! GET    /api/devices/{id}
//! PUT    /api/devices/{id}
//! DELETE /api/devices/{id}
//! POST   /api/devices/{id}/status
//! ```

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Device, DeviceId, DeviceIdentifier, DeviceStatus, DeviceType, Error, Location, NewDevice,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Response payload for a registered device.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: DeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    pub device_type: DeviceType,
    pub model: String,
    pub software_version: String,
    pub province: String,
    pub city: String,
    pub merchant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_status: Option<DeviceStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Device> for DeviceResponse {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id(),
            serial: device.identifier().serial.clone(),
            terminal: device.identifier().terminal.clone(),
            device_type: device.device_type(),
            model: device.model().to_owned(),
            software_version: device.software_version().to_owned(),
            province: device.location().province.clone(),
            city: device.location().city.clone(),
            merchant: device.merchant().to_owned(),
            cash_status: device.cash_status(),
            created_at: device.created_at(),
            updated_at: device.updated_at(),
        }
    }
}

/// Request payload for registering or replacing a device.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub serial: Option<String>,
    pub terminal: Option<String>,
    pub device_type: DeviceType,
    pub model: String,
    pub software_version: String,
    pub province: String,
    pub city: String,
    pub merchant: String,
    pub cash_status: Option<DeviceStatus>,
}

impl DeviceRequest {
    fn into_draft(self) -> Result<NewDevice, Error> {
        let identifier = DeviceIdentifier::new(self.serial, self.terminal)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let location = Location::new(self.province, self.city)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        Ok(NewDevice {
            identifier,
            device_type: self.device_type,
            model: self.model,
            software_version: self.software_version,
            location,
            merchant: self.merchant,
            cash_status: self.cash_status,
        })
    }
}

/// Request payload for a direct status write.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: DeviceStatus,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_devices)
        .service(create_device)
        .service(get_device)
        .service(update_device)
        .service(delete_device)
        .service(set_device_status);
}

/// List the devices visible to the requester.
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Visible devices", body = [DeviceResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["devices"],
    operation_id = "listDevices"
)]
#[get("/devices")]
pub async fn list_devices(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<DeviceResponse>>> {
    let actor = session.actor(&state.identity).await?;
    let devices = state.devices.list(&actor).await?;
    Ok(web::Json(devices.iter().map(DeviceResponse::from).collect()))
}

/// Register a device. Manager-only.
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = DeviceRequest,
    responses(
        (status = 201, description = "Device registered", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Duplicate serial or terminal", body = Error)
    ),
    tags = ["devices"],
    operation_id = "createDevice"
)]
#[post("/devices")]
pub async fn create_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DeviceRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.actor(&state.identity).await?;
    let draft = payload.into_inner().into_draft()?;
    let device = state.devices.create(&actor, draft).await?;
    Ok(HttpResponse::Created().json(DeviceResponse::from(&device)))
}

/// Fetch one device.
#[utoipa::path(
    get,
    path = "/api/devices/{id}",
    params(("id" = Uuid, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device", body = DeviceResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["devices"],
    operation_id = "getDevice"
)]
#[get("/devices/{id}")]
pub async fn get_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<DeviceResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = DeviceId::from_uuid(path.into_inner());
    let device = state.devices.get(&actor, &id).await?;
    Ok(web::Json(DeviceResponse::from(&device)))
}

/// Replace a device's editable fields. Manager-only.
#[utoipa::path(
    put,
    path = "/api/devices/{id}",
    params(("id" = Uuid, Path, description = "Device id")),
    request_body = DeviceRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["devices"],
    operation_id = "updateDevice"
)]
#[put("/devices/{id}")]
pub async fn update_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<DeviceRequest>,
) -> ApiResult<web::Json<DeviceResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = DeviceId::from_uuid(path.into_inner());
    let draft = payload.into_inner().into_draft()?;
    let device = state.devices.update(&actor, &id, draft).await?;
    Ok(web::Json(DeviceResponse::from(&device)))
}

/// Remove a device from the registry. Manager-only.
#[utoipa::path(
    delete,
    path = "/api/devices/{id}",
    params(("id" = Uuid, Path, description = "Device id")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["devices"],
    operation_id = "deleteDevice"
)]
#[delete("/devices/{id}")]
pub async fn delete_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = session.actor(&state.identity).await?;
    let id = DeviceId::from_uuid(path.into_inner());
    state.devices.delete(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Write a status label directly, bypassing the ticket workflow.
#[utoipa::path(
    post,
    path = "/api/devices/{id}/status",
    params(("id" = Uuid, Path, description = "Device id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated device", body = DeviceResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["devices"],
    operation_id = "setDeviceStatus"
)]
#[post("/devices/{id}/status")]
pub async fn set_device_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<SetStatusRequest>,
) -> ApiResult<web::Json<DeviceResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = DeviceId::from_uuid(path.into_inner());
    let device = state
        .devices
        .set_status(&actor, &id, payload.into_inner().status)
        .await?;
    Ok(web::Json(DeviceResponse::from(&device)))
}
