//! Admission pipeline in front of the job store.
//!
//! - [`Dispatcher`] turns a raw link from a requester into a queued job, or
//!   rejects it without touching the store.
//! - [`AdminGate`] exposes the derived statistics queries to admins only.

pub mod admin;
pub mod dispatcher;

pub use admin::{AdminError, AdminGate};
pub use dispatcher::{Dispatcher, DispatcherConfig, SubmitError};
