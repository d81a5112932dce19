//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.
//!
//! - **persistence**: in-process repositories behind the repository ports
//! - **security**: bcrypt password hashing
//! - **blobs**: filesystem attachment storage
//! - **notify**: WebSocket notification fan-out

pub mod blobs;
pub mod notify;
pub mod persistence;
pub mod security;
