//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod devices;
pub mod error;
pub mod reports;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Mount every REST resource under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(users::configure)
            .configure(devices::configure)
            .configure(tickets::configure)
            .configure(reports::configure),
    );
}
