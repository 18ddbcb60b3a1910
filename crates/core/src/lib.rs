//! Domain building blocks shared by every reelq crate.
//!
//! - [`locator`]: link grammar and canonical locator extraction.
//! - [`rate_limit`]: per-identity admission with a cooldown window.
//! - [`media`]: fetched artifacts and scoped scratch-file cleanup.
//! - [`collaborators`]: traits for fetching, notifying and delivering.
//! - [`messages`]: fixed user-facing texts.

pub mod collaborators;
pub mod env;
pub mod error;
pub mod locator;
pub mod media;
pub mod messages;
pub mod rate_limit;
pub mod types;
