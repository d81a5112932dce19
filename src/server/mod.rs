//! Server construction and middleware wiring.

mod config;

pub use config::{SeedAdmin, ServerConfig};

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::SameSite;
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::domain::ports::{PasswordHasher, UserRepository};
use crate::domain::{
    DeviceService, EmailAddress, IdentityService, NewUser, ReportService, Role, TicketService,
    User, UserService,
};
use crate::inbound::http::{self, state::HttpState};
use crate::inbound::ws::{self, ConnectionRegistry};
use crate::outbound::blobs::FsBlobStore;
use crate::outbound::notify::WsNotifier;
use crate::outbound::persistence::{
    MemoryDeviceRepository, MemoryTicketRepository, MemoryUserRepository,
};
use crate::outbound::security::BcryptPasswordHasher;

struct Backend {
    state: HttpState,
    registry: Arc<ConnectionRegistry>,
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

fn build_backend(upload_dir: &Path) -> Backend {
    let users: Arc<MemoryUserRepository> = Arc::new(MemoryUserRepository::new());
    let devices = Arc::new(MemoryDeviceRepository::new());
    let tickets = Arc::new(MemoryTicketRepository::new());
    let hasher: Arc<BcryptPasswordHasher> = Arc::new(BcryptPasswordHasher::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let notifier = Arc::new(WsNotifier::new(Arc::clone(&registry)));
    let blobs = Arc::new(FsBlobStore::new(upload_dir));

    let state = HttpState {
        identity: IdentityService::new(users.clone(), hasher.clone()),
        users: UserService::new(users.clone(), hasher.clone()),
        devices: DeviceService::new(devices.clone(), notifier.clone()),
        tickets: TicketService::new(
            tickets.clone(),
            devices.clone(),
            users.clone(),
            blobs,
            notifier,
        ),
        reports: ReportService::new(tickets, devices, users.clone()),
    };

    Backend {
        state,
        registry,
        users,
        hasher,
    }
}

/// Create the bootstrap superadmin unless the email is already registered.
async fn seed_superadmin(
    users: &Arc<dyn UserRepository>,
    hasher: &Arc<dyn PasswordHasher>,
    seed: &SeedAdmin,
) -> std::io::Result<()> {
    let email = EmailAddress::new(&seed.email)
        .map_err(|e| std::io::Error::other(format!("invalid FLEETDESK_ADMIN_EMAIL: {e}")))?;
    let existing = users
        .find_by_email(email.as_ref())
        .await
        .map_err(std::io::Error::other)?;
    if existing.is_some() {
        return Ok(());
    }
    let password_hash = hasher
        .hash(&seed.password)
        .map_err(std::io::Error::other)?;
    let user = User::create(NewUser {
        name: "Superadmin".into(),
        email,
        phone: "-".into(),
        role: Role::Superadmin,
        allowed_device_types: BTreeSet::new(),
        password_hash,
    })
    .map_err(std::io::Error::other)?;
    users.insert(&user).await.map_err(std::io::Error::other)?;
    info!(email = %seed.email, "bootstrap superadmin created");
    Ok(())
}

#[cfg(debug_assertions)]
async fn openapi_json() -> actix_web::HttpResponse {
    use utoipa::OpenApi;
    actix_web::HttpResponse::Ok().json(crate::ApiDoc::openapi())
}

/// Build the backend, seed the bootstrap account, and run the server until
/// shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let backend = build_backend(&config.upload_dir);
    if let Some(seed) = &config.seed_admin {
        seed_superadmin(&backend.users, &backend.hasher, seed).await?;
    }

    let state = web::Data::new(backend.state);
    let registry = web::Data::from(backend.registry);
    let key = config.key.clone();
    let cookie_secure = config.cookie_secure;

    info!(addr = %config.bind_addr(), "starting server");
    HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        let app = App::new()
            .app_data(state.clone())
            .app_data(registry.clone())
            .wrap(session)
            .configure(http::configure)
            .service(ws::ws_entry);

        #[cfg(debug_assertions)]
        let app = app.route("/api-docs/openapi.json", web::get().to(openapi_json));

        app
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
