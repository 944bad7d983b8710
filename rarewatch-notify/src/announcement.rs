//! Announcement payload and its chat embed rendering.

use serde::{Deserialize, Serialize};

use rarewatch_core::{Action, Creation};

/// Embed side-bar colour.
pub const EMBED_COLOR: u32 = 0x00FF00;

/// Everything a sink needs to announce one new action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub creation_name: String,
    pub creation_url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_url: Option<String>,
}

impl Announcement {
    pub fn new(creation: &Creation, action: &Action) -> Self {
        Self {
            creation_name: creation.name.clone(),
            creation_url: creation.url.clone(),
            description: action.description.clone(),
            image_url: creation.image_url().map(str::to_string),
            transaction_id: action.transaction_id.clone(),
            transaction_url: action.transaction_url(),
        }
    }

    /// Render as a chat embed, optionally signed by `author`.
    pub fn to_embed(&self, author: Option<&EmbedAuthor>) -> Embed {
        let fields = match (&self.transaction_id, &self.transaction_url) {
            (Some(id), Some(url)) => vec![EmbedField {
                name: "Transaction".to_string(),
                value: format!("[{id}]({url})"),
                inline: false,
            }],
            _ => Vec::new(),
        };

        Embed {
            title: self.creation_name.clone(),
            description: self.description.clone(),
            url: self.creation_url.clone(),
            color: EMBED_COLOR,
            author: author.cloned(),
            thumbnail: self.image_url.clone().map(|url| EmbedImage { url }),
            fields,
        }
    }
}

// ---------------------------------------------------------------------------
// Embed wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}
