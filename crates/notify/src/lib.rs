//! Requester-facing delivery channels.
//!
//! Both types implement [`Notifier`](reelq_core::collaborators::Notifier)
//! and [`MediaDelivery`](reelq_core::collaborators::MediaDelivery):
//!
//! - [`WebhookNotifier`] posts messages, progress and media to a transport
//!   gateway over HTTP, retrying terminal deliveries with backoff.
//! - [`LogNotifier`] only writes to the tracing log; used when no gateway is
//!   configured.

pub mod log;
pub mod webhook;

pub use log::LogNotifier;
pub use webhook::WebhookNotifier;
