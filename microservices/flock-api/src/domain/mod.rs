//! Domain module

pub mod notification;
pub mod principal;

pub use notification::NotificationEvent;
pub use principal::Principal;
