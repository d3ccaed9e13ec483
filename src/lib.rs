//! Meeting Scheduler Service
//!
//! This library implements the scheduling core of a meeting-room booking
//! system: availability checks, an approval workflow driven by organizer
//! roles, candidate membership diffing on edits, one-shot start-time
//! reminders and best-effort notification delivery through a mail relay.
//!
//! # Modules
//!
//! - `services::meetings`: the engine facade a request layer calls
//! - `services::database`: CSV-backed meeting persistence
//! - `services::reminder`: timer registry for pre-start reminders
//! - `client`: MailRelayClient for notification delivery
//! - `auth`: request signing for the mail relay API
//!
//! # Authentication
//!
//! The mail relay uses AKSK (SecretId, SecretKey) authentication with
//! HMAC-SHA256 signatures. The signing logic is encapsulated in the
//! `auth` module.

pub mod auth;
pub mod client;
pub mod errors;
pub mod models;
pub mod services;
pub mod templates;

#[cfg(test)]
pub mod client_mock;

#[cfg(test)]
mod tests;

// Re-export the main engine types for ease of use
pub use auth::MailRelayAuth;
pub use client::MailRelayClient;
pub use errors::{ServiceError, ServiceResult};
pub use services::meetings::MeetingService;
pub use services::notifier::{NotificationSink, Notifier};
pub use services::reminder::ReminderScheduler;
