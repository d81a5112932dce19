//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The signed session cookie carries the full [`SessionClaims`] payload, so
//! no server-side session store is needed. Handlers pull an authenticated
//! [`Actor`] through these helpers and never touch the cookie directly.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Actor, Error, IdentityService, SessionClaims};

pub(crate) const CLAIMS_KEY: &str = "claims";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated claims in the session cookie.
    pub fn persist_claims(&self, claims: &SessionClaims) -> Result<(), Error> {
        self.0
            .insert(CLAIMS_KEY, claims)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current claims, if present. Unreadable cookie payloads are
    /// treated as an absent session rather than a server fault.
    pub fn claims(&self) -> Option<SessionClaims> {
        match self.0.get::<SessionClaims>(CLAIMS_KEY) {
            Ok(claims) => claims,
            Err(error) => {
                tracing::warn!(%error, "unreadable claims in session cookie");
                None
            }
        }
    }

    /// Require unexpired claims or return `401 Unauthorized`.
    pub fn require_claims(&self) -> Result<SessionClaims, Error> {
        let claims = self
            .claims()
            .ok_or_else(|| Error::unauthorized("login required"))?;
        if claims.is_expired() {
            self.purge();
            return Err(Error::unauthorized("session has expired"));
        }
        Ok(claims)
    }

    /// Resolve the requesting actor from the session, re-reading the user
    /// record so role changes apply immediately.
    pub async fn actor(&self, identity: &IdentityService) -> Result<Actor, Error> {
        let claims = self.require_claims()?;
        identity.resolve_actor(&claims).await
    }

    /// Drop every session entry, invalidating the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
