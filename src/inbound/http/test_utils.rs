//! Test helpers for inbound HTTP components.

use std::collections::BTreeSet;
use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::test;

use crate::domain::{
    DeviceService, DeviceType, EmailAddress, IdentityService, NewUser, ReportService, Role,
    TicketService, User, UserService,
};
use crate::domain::ports::PasswordHasher;
use crate::inbound::http::state::HttpState;
use crate::inbound::ws::ConnectionRegistry;
use crate::outbound::blobs::FsBlobStore;
use crate::outbound::notify::WsNotifier;
use crate::outbound::persistence::{
    MemoryDeviceRepository, MemoryTicketRepository, MemoryUserRepository,
};
use crate::outbound::security::BcryptPasswordHasher;

// bcrypt's minimum cost factor, to keep test suites fast. The crate itself
// only exports `DEFAULT_COST`.
const TEST_HASH_COST: u32 = 4;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// A full backend over in-process adapters, with direct repository handles
/// for seeding fixtures.
pub struct TestBackend {
    pub state: HttpState,
    pub users: Arc<MemoryUserRepository>,
    pub devices: Arc<MemoryDeviceRepository>,
    pub tickets: Arc<MemoryTicketRepository>,
    pub registry: Arc<ConnectionRegistry>,
    hasher: Arc<BcryptPasswordHasher>,
    // Held so the upload directory outlives the backend.
    _upload_dir: Arc<tempfile::TempDir>,
}

impl TestBackend {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserRepository::new());
        let devices = Arc::new(MemoryDeviceRepository::new());
        let tickets = Arc::new(MemoryTicketRepository::new());
        let hasher = Arc::new(BcryptPasswordHasher::with_cost(TEST_HASH_COST));
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Arc::new(WsNotifier::new(Arc::clone(&registry)));
        let upload_dir = Arc::new(tempfile::tempdir().expect("tempdir"));
        let blobs = Arc::new(FsBlobStore::new(upload_dir.path()));

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
            reports: ReportService::new(tickets.clone(), devices.clone(), users.clone()),
        };

        Self {
            state,
            users,
            devices,
            tickets,
            registry,
            hasher,
            _upload_dir: upload_dir,
        }
    }

    /// Seed a user with the given credentials directly into the store.
    pub async fn seed_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
        types: &[DeviceType],
    ) -> User {
        let user = User::create(NewUser {
            name: name.into(),
            email: EmailAddress::new(email).expect("valid email"),
            phone: "0912".into(),
            role,
            allowed_device_types: types.iter().copied().collect::<BTreeSet<_>>(),
            password_hash: self.hasher.hash(password).expect("hashing succeeds"),
        })
        .expect("valid draft");
        use crate::domain::ports::UserRepository;
        self.users.insert(&user).await.expect("seed insert");
        user
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Log in through the HTTP surface and return the session cookie.
pub async fn login(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "email": email, "password": password }))
            .to_request(),
    )
    .await;
    assert!(
        res.status().is_success(),
        "login failed with {}",
        res.status()
    );
    res.response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie set")
        .into_owned()
}
