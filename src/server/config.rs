//! Server configuration assembled from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::Key;
use tracing::warn;

/// Bootstrap credentials for the first superadmin account.
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

/// Everything the server needs to start, read once at boot.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) upload_dir: PathBuf,
    pub(crate) seed_admin: Option<SeedAdmin>,
}

impl ServerConfig {
    /// Read the configuration from the environment.
    ///
    /// A missing or unreadable session key file is fatal outside debug
    /// builds unless `SESSION_ALLOW_EPHEMERAL=1` opts into a generated key.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr = env::var("FLEETDESK_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".into())
            .parse::<SocketAddr>()
            .map_err(|e| std::io::Error::other(format!("invalid FLEETDESK_BIND_ADDR: {e}")))?;

        let key_path =
            env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
        let key = match std::fs::read(&key_path) {
            Ok(bytes) => Key::derive_from(&bytes),
            Err(e) => {
                let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                    Key::generate()
                } else {
                    return Err(std::io::Error::other(format!(
                        "failed to read session key at {key_path}: {e}"
                    )));
                }
            }
        };

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v != "0")
            .unwrap_or(true);

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        let seed_admin = match (
            env::var("FLEETDESK_ADMIN_EMAIL"),
            env::var("FLEETDESK_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SeedAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            key,
            cookie_secure,
            bind_addr,
            upload_dir,
            seed_admin,
        })
    }

    /// The socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
