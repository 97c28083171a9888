//! Link-preview metadata for chat clients that unfurl file URLs.

use serde::{Deserialize, Serialize};

use cdn_blob::ObjectHead;

const DISCORD_BOT: &str = "Discordbot";

/// oEmbed resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
    Photo,
    Video,
    Link,
}

impl EmbedKind {
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image") {
            EmbedKind::Photo
        } else if content_type.starts_with("video") {
            EmbedKind::Video
        } else {
            EmbedKind::Link
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(rename = "type")]
    pub kind: EmbedKind,
    /// `"<size> | <content type>"`
    pub author_name: String,
    /// Last-modified time of the object, HTTP date format
    pub provider_name: String,
}

impl Embed {
    pub fn from_head(head: &ObjectHead) -> Self {
        let content_type = head
            .content_type
            .as_deref()
            .unwrap_or(cdn_blob::OCTET_STREAM);

        Self {
            kind: EmbedKind::from_content_type(content_type),
            author_name: format!("{} | {}", human_size(head.size_bytes), content_type),
            provider_name: head
                .last_modified
                .map(|t| t.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Whether the user agent belongs to a link-preview bot.
pub fn is_preview_bot(user_agent: &str) -> bool {
    user_agent.contains(DISCORD_BOT)
}

/// Byte count in B, KB, MB or GB (1024-based, one decimal above bytes).
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
