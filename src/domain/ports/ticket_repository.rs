//! Port abstraction for ticket persistence adapters.

use async_trait::async_trait;

use crate::domain::{Ticket, TicketId};

use super::RepositoryError;

/// Port for reading and writing support tickets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a new ticket.
    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Replace an existing ticket record.
    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Fetch a ticket by identifier.
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError>;

    /// List every ticket, newest first.
    async fn list(&self) -> Result<Vec<Ticket>, RepositoryError>;
}
