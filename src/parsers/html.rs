use crate::parsers::{ParseResult, text};
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

/// Elements whose whole subtree is dropped before text extraction
pub const STRIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "aside"];

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Parses HTML content to extract text and links
pub fn parse(html: &str) -> ParseResult {
    let doc = Html::parse_document(html);
    ParseResult::new(visible_text(&doc), links(&doc))
}

/// Normalized visible text of a document.
///
/// Malformed markup is parsed best-effort; this never fails.
pub fn extract_text(html: &str) -> String {
    visible_text(&Html::parse_document(html))
}

/// Raw `href` values of every anchor, in document order
pub fn extract_links(html: &str) -> Vec<String> {
    links(&Html::parse_document(html))
}

fn visible_text(doc: &Html) -> String {
    let raw = doc
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(t) if !node.ancestors().any(|a| is_stripped(a.value())) => Some(&**t),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");

    text::normalize_whitespace(&raw)
}

fn is_stripped(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| STRIPPED_TAGS.contains(&el.name()))
}

fn links(doc: &Html) -> Vec<String> {
    let links = doc
        .select(&LINK_SELECTOR)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::trace!("HTML parser found {} links", links.len());
    links
}
