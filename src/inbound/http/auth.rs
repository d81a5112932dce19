//! Authentication HTTP handlers.
//!
//! ```text
//! POST /api/auth/login
//! POST /api/auth/logout
//! ```

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::ApiResult;

/// Request payload for logging in.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Extends the session lifetime from 12 hours to 7 days.
    #[serde(default)]
    pub remember: bool,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login).service(logout);
}

/// Exchange credentials for a session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login"
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let payload = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    let authenticated = state
        .identity
        .authenticate(&credentials, payload.remember)
        .await?;
    session.persist_claims(&authenticated.claims)?;
    Ok(web::Json(UserResponse::from(&authenticated.user)))
}

/// Invalidate the session cookie.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::domain::Role;
    use crate::inbound::http::test_utils::{login, TestBackend};

    async fn spawn(
        backend: &TestBackend,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        test::init_service(
            App::new()
                .wrap(crate::inbound::http::test_utils::test_session_middleware())
                .app_data(web::Data::new(backend.state.clone()))
                .configure(crate::inbound::http::configure),
        )
        .await
    }

    #[actix_web::test]
    async fn login_returns_the_profile_and_a_cookie() {
        let backend = TestBackend::new();
        backend
            .seed_user("Root", "root@example.com", "pw", Role::Superadmin, &[])
            .await;
        let app = spawn(&backend).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "Root@Example.com", "password": "pw" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.response().cookies().any(|c| c.name() == "session"));
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["email"], "root@example.com");
        assert_eq!(body["role"], "superadmin");
        assert!(body.get("passwordHash").is_none());
    }

    #[actix_web::test]
    async fn wrong_password_is_indistinct_from_unknown_email() {
        let backend = TestBackend::new();
        backend
            .seed_user("Root", "root@example.com", "pw", Role::Superadmin, &[])
            .await;
        let app = spawn(&backend).await;

        for payload in [
            json!({ "email": "root@example.com", "password": "wrong" }),
            json!({ "email": "ghost@example.com", "password": "pw" }),
        ] {
            let res = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri("/api/auth/login")
                    .set_json(payload)
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(res).await;
            assert_eq!(body["message"], "invalid email or password");
        }
    }

    #[actix_web::test]
    async fn blank_email_is_a_bad_request() {
        let backend = TestBackend::new();
        let app = spawn(&backend).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(json!({ "email": "  ", "password": "pw" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn logout_invalidates_the_session() {
        let backend = TestBackend::new();
        backend
            .seed_user("Root", "root@example.com", "pw", Role::Superadmin, &[])
            .await;
        let app = spawn(&backend).await;
        let cookie = login(&app, "root@example.com", "pw").await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let cleared = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("purge rewrites the cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/users")
                .cookie(cleared.into_owned())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
