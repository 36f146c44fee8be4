pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

/// Result of parsing a rendered page
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Normalized visible text
    pub content: String,
    /// Raw `href` values of the page's anchors, in document order
    pub links: Vec<String>,
}

impl ParseResult {
    /// Creates a new parse result with the given content and links
    pub fn new(content: String, links: Vec<String>) -> Self {
        Self { content, links }
    }
}

/// Extract both the visible text and the anchor targets of a page
pub fn parse(html: &str) -> ParseResult {
    html::parse(html)
}
