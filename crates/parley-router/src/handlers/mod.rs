//! Domain handlers, grouped by what they touch.

mod friends;
mod groups;
mod messages;
mod sync;

/// Rejects empty or whitespace-only chat content.
fn require_content(content: &str) -> Result<(), crate::RouterError> {
    if content.trim().is_empty() {
        return Err(crate::RouterError::InvalidMessage(
            "content must not be empty".into(),
        ));
    }
    Ok(())
}
