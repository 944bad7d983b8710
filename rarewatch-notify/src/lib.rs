//! Notification sink boundary.
//!
//! Every newly detected action becomes one [`Announcement`], handed to a
//! [`Notifier`]. [`DiscordNotifier`] posts it to a channel as an embed;
//! [`LogNotifier`] only writes it to the log.

pub mod announcement;
pub mod discord;
mod error;

use async_trait::async_trait;

pub use announcement::{Announcement, Embed, EmbedAuthor};
pub use discord::DiscordNotifier;
pub use error::NotifyError;

/// Delivers one announcement. Implementations must not retry on their own
/// account beyond what their transport does.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError>;
}

/// Writes announcements to the tracing log instead of a chat channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        tracing::info!(
            creation = %announcement.creation_name,
            url = %announcement.creation_url,
            transaction = announcement.transaction_url.as_deref().unwrap_or("-"),
            "{}",
            announcement.description,
        );
        Ok(())
    }
}
