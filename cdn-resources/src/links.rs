use chrono::{DateTime, Utc};
use serde::Serialize;

use cdn_blob::ObjectSummary;
use cdn_core::CdnConfig;

/// Public URLs of one stored object, built from a listing entry alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLinks {
    pub cdn_url: String,
    #[serde(rename = "spaces_url")]
    pub storage_url: String,
    #[serde(rename = "spaces_cdn")]
    pub storage_cdn_url: String,
    pub file_name: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size: u64,
}

impl FileLinks {
    pub fn from_summary(config: &CdnConfig, summary: &ObjectSummary) -> Self {
        let key = &summary.key;
        Self {
            cdn_url: format!("{}/{}", config.cdn_endpoint, key),
            storage_url: format!("{}/{}", config.spaces.url, key),
            storage_cdn_url: format!("{}/{}", config.spaces.cdn_url, key),
            file_name: key.clone(),
            last_modified: summary.last_modified,
            size: summary.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_share_the_object_key() {
        let mut config = CdnConfig::local("https://cdn.example.com", "https://bucket.example.com");
        config.spaces.cdn_url = "https://bucket.cdn.example.com".to_string();

        let summary = ObjectSummary {
            key: "aZ3k9QpX.png".to_string(),
            size: 10,
            last_modified: None,
        };
        let links = FileLinks::from_summary(&config, &summary);

        assert_eq!(links.cdn_url, "https://cdn.example.com/aZ3k9QpX.png");
        assert_eq!(links.storage_url, "https://bucket.example.com/aZ3k9QpX.png");
        assert_eq!(links.storage_cdn_url, "https://bucket.cdn.example.com/aZ3k9QpX.png");
        assert_eq!(links.file_name, "aZ3k9QpX.png");
        assert_eq!(links.size, 10);

        let json = serde_json::to_value(&links).unwrap();
        assert_eq!(json["spaces_url"], "https://bucket.example.com/aZ3k9QpX.png");
        assert_eq!(json["spaces_cdn"], "https://bucket.cdn.example.com/aZ3k9QpX.png");
    }
}
