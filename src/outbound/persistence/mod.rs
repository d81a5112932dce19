//! In-process repository adapters.
//!
//! Each repository keeps its records in an `RwLock`-guarded map and enforces
//! the uniqueness rules the ports promise (email, device serial/terminal).
//! Swapping in a database-backed adapter only touches this module.

mod memory_device_repository;
mod memory_ticket_repository;
mod memory_user_repository;

pub use memory_device_repository::MemoryDeviceRepository;
pub use memory_ticket_repository::MemoryTicketRepository;
pub use memory_user_repository::MemoryUserRepository;
