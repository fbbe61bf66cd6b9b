//! Alert delivery to chat channels.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - Telegram notifier implementation
//! - Minijinja rendering of summary and batch messages
//! - `AlertDispatcher`, which batches and paces alert delivery

pub mod dispatcher;
pub mod telegram;
pub mod templating;
pub mod traits;

pub use dispatcher::AlertDispatcher;
pub use telegram::TelegramNotifier;
pub use templating::MessageRenderer;
pub use traits::{
    AlertSink, DeliveryReport, DispatchResult, MessageKind, Notification, Notifier, NotifyError,
};
