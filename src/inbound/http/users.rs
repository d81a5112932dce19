//! User directory HTTP handlers.
//!
//! ```text
//! GET    /api/users
//! POST   /api/users
//! GET    /api/users/{id}
//! PUT    /api/users/{id}
//! DELETE /api/users/{id}
//! ```

use std::collections::BTreeSet;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    CreateUser, DeviceType, EmailAddress, Error, Role, UpdateUser, User, UserId,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Response payload for a user record. The password hash never leaves the
/// domain layer.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().to_string(),
            phone: user.phone().to_owned(),
            role: user.role(),
            allowed_device_types: user.allowed_device_types().clone(),
            created_at: user.created_at(),
        }
    }
}

/// Request payload for creating an account.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub password: String,
}

/// Request payload for a full-record account update. `password` is optional
/// and leaves the stored hash untouched when absent or blank.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(default)]
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub password: Option<String>,
}

fn parse_email(raw: &str) -> Result<EmailAddress, Error> {
    EmailAddress::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

/// List the accounts visible to the requester.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Visible accounts", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let actor = session.actor(&state.identity).await?;
    let users = state.users.list(&actor).await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 409, description = "Duplicate email", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.actor(&state.identity).await?;
    let payload = payload.into_inner();
    let request = CreateUser {
        name: payload.name,
        email: parse_email(&payload.email)?,
        phone: payload.phone,
        role: payload.role,
        allowed_device_types: payload.allowed_device_types,
        password: payload.password,
    };
    let user = state.users.create(&actor, request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = UserId::from_uuid(path.into_inner());
    let user = state.users.get(&actor, &id).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Apply a full-record account update.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = session.actor(&state.identity).await?;
    let id = UserId::from_uuid(path.into_inner());
    let payload = payload.into_inner();
    let request = UpdateUser {
        name: payload.name,
        email: parse_email(&payload.email)?,
        phone: payload.phone,
        role: payload.role,
        allowed_device_types: payload.allowed_device_types,
        password: payload.password,
    };
    let user = state.users.update(&actor, &id, request).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Delete an account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = session.actor(&state.identity).await?;
    let id = UserId::from_uuid(path.into_inner());
    state.users.delete(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
