//! In-process ticket repository.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{RepositoryError, TicketRepository};
use crate::domain::{Ticket, TicketId};

/// Map-backed [`TicketRepository`]. Listing returns newest first.
#[derive(Debug, Default)]
pub struct MemoryTicketRepository {
    records: RwLock<HashMap<TicketId, Ticket>>,
}

impl MemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::connection("ticket store lock poisoned")
}

#[async_trait]
impl TicketRepository for MemoryTicketRepository {
    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if !records.contains_key(&ticket.id()) {
            return Err(RepositoryError::query("ticket vanished during update"));
        }
        records.insert(ticket.id(), ticket.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Ticket>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut tickets: Vec<_> = records.values().cloned().collect();
        tickets.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(tickets)
    }
}
