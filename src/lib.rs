//! FleetDesk: ticketing and device inventory for payment-terminal fleets.
//!
//! The crate is organised hexagonally: `domain` holds the models, the
//! authorization engine, and the services; `inbound` adapts HTTP and
//! WebSocket traffic onto them; `outbound` implements the driven ports
//! (stores, password hashing, blob storage, realtime notification).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
