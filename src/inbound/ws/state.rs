//! Per-user connection registry backing notification fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::domain::UserId;

struct Connection {
    conn_id: u64,
    sender: UnboundedSender<String>,
}

/// Registry mapping each user to their most recent live connection.
///
/// ## Invariants
/// - At most one entry per user: a new registration replaces the previous
///   one (last-registration-wins).
/// - A connection only removes its own entry on disconnect, so a stale
///   session can never evict its replacement.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<UserId, Connection>>,
    next_conn_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for a user, returning the connection id and
    /// the receiving end of its outbound queue.
    pub fn register(&self, user_id: UserId) -> (u64, UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut connections = lock_or_recover(&self.connections);
        if connections
            .insert(user_id, Connection { conn_id, sender })
            .is_some()
        {
            debug!(user_id = %user_id, "replaced existing connection");
        }
        (conn_id, receiver)
    }

    /// Remove a connection, but only if it still owns the user's entry.
    pub fn unregister(&self, user_id: &UserId, conn_id: u64) {
        let mut connections = lock_or_recover(&self.connections);
        if connections
            .get(user_id)
            .is_some_and(|c| c.conn_id == conn_id)
        {
            connections.remove(user_id);
        }
    }

    /// Queue a frame for one user, if connected. Returns whether a live
    /// connection accepted it.
    pub fn send_to(&self, user_id: &UserId, frame: String) -> bool {
        let connections = lock_or_recover(&self.connections);
        match connections.get(user_id) {
            Some(connection) => connection.sender.send(frame).is_ok(),
            None => false,
        }
    }

    /// Queue a frame for every connected user.
    pub fn broadcast(&self, frame: &str) {
        let connections = lock_or_recover(&self.connections);
        for (user_id, connection) in connections.iter() {
            if connection.sender.send(frame.to_owned()).is_err() {
                warn!(user_id = %user_id, "dropped frame for closed connection");
            }
        }
    }

    #[cfg(test)]
    pub fn connected_users(&self) -> usize {
        lock_or_recover(&self.connections).len()
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // The registry never panics while holding the lock; recover the data if
    // a caller thread did.
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_registration_wins() {
        let registry = ConnectionRegistry::new();
        let user = UserId::random();
        let (_first_id, mut first_rx) = registry.register(user);
        let (_second_id, mut second_rx) = registry.register(user);

        assert!(registry.send_to(&user, "hello".into()));
        assert_eq!(second_rx.try_recv().ok().as_deref(), Some("hello"));
        assert!(first_rx.try_recv().is_err());
    }

    #[test]
    fn stale_connection_cannot_evict_its_replacement() {
        let registry = ConnectionRegistry::new();
        let user = UserId::random();
        let (first_id, _first_rx) = registry.register(user);
        let (_second_id, mut second_rx) = registry.register(user);

        registry.unregister(&user, first_id);
        assert!(registry.send_to(&user, "still here".into()));
        assert_eq!(second_rx.try_recv().ok().as_deref(), Some("still here"));
    }

    #[test]
    fn unregister_removes_the_owning_entry() {
        let registry = ConnectionRegistry::new();
        let user = UserId::random();
        let (conn_id, _rx) = registry.register(user);

        registry.unregister(&user, conn_id);
        assert!(!registry.send_to(&user, "gone".into()));
        assert_eq!(registry.connected_users(), 0);
    }

    #[test]
    fn broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new();
        let (_a_id, mut a_rx) = registry.register(UserId::random());
        let (_b_id, mut b_rx) = registry.register(UserId::random());

        registry.broadcast("ping");
        assert_eq!(a_rx.try_recv().ok().as_deref(), Some("ping"));
        assert_eq!(b_rx.try_recv().ok().as_deref(), Some("ping"));
    }
}
