use serde::{Deserialize, Serialize};

/// One analyzed page, serialized as `{"URL", "site_type", "content", "errors"}`.
///
/// Records are immutable once built: the fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Final (post-redirect) absolute URL of the page
    #[serde(rename = "URL")]
    url: String,

    /// Classification label, inherited from the parent for subpages
    site_type: String,

    /// Normalized plain text
    content: String,

    /// Set only when part of the page's processing failed but the record was still emitted
    #[serde(rename = "errors")]
    error: Option<String>,
}

impl PageRecord {
    /// Create a record with no error note
    pub fn new(url: impl Into<String>, site_type: impl Into<String>, content: String) -> Self {
        Self {
            url: url.into(),
            site_type: site_type.into(),
            content,
            error: None,
        }
    }

    /// Create a record carrying an error note
    pub fn with_error(
        url: impl Into<String>,
        site_type: impl Into<String>,
        content: String,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(url, site_type, content)
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn site_type(&self) -> &str {
        &self.site_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Serialize records as the pretty-printed JSON array handed to callers.
/// Non-ASCII text is emitted as-is.
pub fn to_json(records: &[PageRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}
