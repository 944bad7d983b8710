//! Discord REST sink.
//!
//! Only the three endpoints the bot needs are used: the bot's own user (for
//! the embed author), the target channel (to check it belongs to the
//! configured server) and message creation. Calls are blocking `ureq`
//! requests moved onto tokio's blocking pool.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::announcement::{Announcement, EmbedAuthor};
use crate::{Notifier, NotifyError};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DISCORD_CDN: &str = "https://cdn.discordapp.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct BotUser {
    id: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    guild_id: Option<String>,
}

#[derive(Clone)]
pub struct DiscordNotifier {
    agent: ureq::Agent,
    api_base: String,
    token: String,
    channel_id: u64,
    author: Option<EmbedAuthor>,
}

impl fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("author", &self.author)
            .finish()
    }
}

impl DiscordNotifier {
    pub fn new(token: impl Into<String>, channel_id: u64) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            api_base: DISCORD_API_BASE.to_string(),
            token: token.into(),
            channel_id,
            author: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn author(&self) -> Option<&EmbedAuthor> {
        self.author.as_ref()
    }

    /// Check the credentials, confirm the channel lives on `server_id`, and
    /// remember the bot user as embed author.
    pub async fn connect(self, server_id: u64) -> Result<Self, NotifyError> {
        tokio::task::spawn_blocking(move || self.connect_blocking(server_id))
            .await
            .map_err(|err| NotifyError::Join(err.to_string()))?
    }

    fn connect_blocking(mut self, server_id: u64) -> Result<Self, NotifyError> {
        let user: BotUser = self
            .agent
            .get(&format!("{}/users/@me", self.api_base))
            .set("Authorization", &self.auth_header())
            .call()?
            .into_json()
            .map_err(|err| NotifyError::Decode(err.to_string()))?;

        let channel: Channel = self
            .agent
            .get(&format!("{}/channels/{}", self.api_base, self.channel_id))
            .set("Authorization", &self.auth_header())
            .call()?
            .into_json()
            .map_err(|err| NotifyError::Decode(err.to_string()))?;

        let expected = server_id.to_string();
        if channel.guild_id.as_deref() != Some(expected.as_str()) {
            return Err(NotifyError::Misconfigured(format!(
                "channel {} is not on server {server_id}",
                self.channel_id
            )));
        }

        tracing::info!(user = %user.username, channel = self.channel_id, "logged in to chat");
        self.author = Some(EmbedAuthor {
            icon_url: user
                .avatar
                .as_deref()
                .map(|hash| format!("{DISCORD_CDN}/avatars/{}/{hash}.png", user.id)),
            name: user.username,
        });
        Ok(self)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    fn post_blocking(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        let embed = announcement.to_embed(self.author.as_ref());
        self.agent
            .post(&format!(
                "{}/channels/{}/messages",
                self.api_base, self.channel_id
            ))
            .set("Authorization", &self.auth_header())
            .send_json(json!({ "embeds": [embed] }))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        let this = self.clone();
        let announcement = announcement.clone();
        tokio::task::spawn_blocking(move || this.post_blocking(&announcement))
            .await
            .map_err(|err| NotifyError::Join(err.to_string()))?
    }
}
