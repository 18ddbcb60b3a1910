//! Fixed user-facing texts sent to requesters.
//!
//! Transports may localize or restyle these; the core only guarantees that
//! "unavailable" and generic failures use distinct texts.

/// Acknowledgement returned when a link is accepted into the queue.
pub const MSG_QUEUED: &str = "⏳ Processing your request...";

/// Rejection for a link that does not match the locator grammar.
pub const MSG_INVALID_LINK: &str = "❌ Invalid Instagram link!";

/// Rejection for a requester still inside its cooldown window.
pub const MSG_RATE_LIMITED: &str = "⏳ Please wait before sending another request.";

/// Rejection for a requester outside the configured allowlist.
pub const MSG_NOT_AUTHORIZED: &str = "❌ You are not authorized to use this bot.";

/// Rejection for a non-admin asking for statistics.
pub const MSG_NOT_ADMIN: &str = "❌ You are not authorized to view stats.";

/// Sent after the artifact has been delivered and the job recorded.
pub const MSG_COMPLETED: &str = "✅ Download complete!";

/// Terminal failure when the source is private or missing.
pub const MSG_UNAVAILABLE: &str = "❌ Failed to download. The post might be private or unavailable.";

/// Terminal failure for every other cause.
pub const MSG_FAILED: &str = "❌ Failed to download media.";

/// Alert raised to admins on an unexpected worker error.
pub const MSG_ADMIN_ALERT: &str = "⚠️ Bot encountered an error! Check logs.";

/// Caption for a delivered video.
pub const CAPTION_VIDEO: &str = "🎥 Download Complete!";

/// Caption for a delivered image.
pub const CAPTION_IMAGE: &str = "🖼️ Download Complete!";

/// Progress text for a cosmetic progress tick.
pub fn progress(percent: u8) -> String {
    format!("⏳ Downloading... {percent}%")
}

/// Statistics text for the admin query.
pub fn stats(completed: i64) -> String {
    format!("📊 Total downloads processed: {completed}")
}
