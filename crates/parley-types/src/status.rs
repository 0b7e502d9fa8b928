//! Status-line texts shown by the presentation layer.

pub const READY: &str = "Ready! Start a conversation any time.";
pub const GENERATING: &str = "⌛ Generating a reply...";
pub const DRAFT_PLACEHOLDER: &str = "⌛ typing...";
pub const COMPLETED: &str = "Reply complete";
pub const STOPPED: &str = "Stopped the running generation.";

/// Status text for a failed submission.
pub fn failure(message: &str) -> String {
    format!("⚠ {}", message)
}
