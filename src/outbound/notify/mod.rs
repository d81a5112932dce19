//! Notification delivery adapters.

mod ws_notifier;

pub use ws_notifier::WsNotifier;
