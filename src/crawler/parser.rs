//! HTML parser for forum pages
//!
//! This module handles parsing HTML content to extract:
//! - Topic links from a section listing page
//! - Title, author, body text and links from a topic page
//!
//! Missing or malformed markup never fails the parse; each field falls back
//! to a documented default instead.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Title used when the page has no usable `<title>`
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Author used when no author marker element exists
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// The forum appends its own name after this separator in page titles
const TITLE_SEPARATOR: &str = " | ";

static TOPIC_HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"topic=(\d+)\.msg\d+").expect("hardcoded regex pattern is valid")
});

/// Fields extracted from a topic page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPost {
    /// Leading segment of `<title>` before the site separator
    pub title: String,

    /// Text of the first author marker element
    pub author: String,

    /// Whole text of the first post container
    pub body: String,

    /// Absolute http(s) link targets inside the post container
    pub links: Vec<String>,
}

/// A topic found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLink {
    /// Topic id parsed from `topic=<id>`
    pub id: i64,

    /// Absolute URL of the topic page
    pub url: String,
}

/// Parses a topic page
///
/// # Fallbacks
///
/// | Field | Source | When absent |
/// |-------|--------|-------------|
/// | title | `<title>` up to `" | "` | [`UNKNOWN_TITLE`] |
/// | author | first element whose `id` contains `author_` | [`UNKNOWN_AUTHOR`] |
/// | body | text of first `div.post` | empty string |
/// | links | `a[href]` inside that `div.post` | empty |
///
/// # Example
///
/// ```
/// use talkscan::crawler::parse_post;
///
/// let html = r#"<html><head><title>[ANN] Coin | Bitcoin Forum</title></head>
///     <body><span id="author_7">satoshi</span><div class="post">Hello</div></body></html>"#;
/// let post = parse_post(html);
/// assert_eq!(post.title, "[ANN] Coin");
/// assert_eq!(post.author, "satoshi");
/// assert_eq!(post.body, "Hello");
/// ```
pub fn parse_post(html: &str) -> ExtractedPost {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let author = extract_author(&document).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let post = Selector::parse("div.post")
        .ok()
        .and_then(|selector| document.select(&selector).next());

    let (body, links) = match post {
        Some(element) => (
            element.text().collect::<String>().trim().to_string(),
            extract_post_links(element),
        ),
        None => (String::new(), Vec::new()),
    };

    ExtractedPost {
        title,
        author,
        body,
        links,
    }
}

/// Extracts topic links from a section listing page
///
/// Only anchors whose `href` has the `topic=<id>.msg<n>` shape and whose
/// class list contains `new` are kept. Topics without that marker are not
/// discovered. Relative hrefs are resolved against `base_url`; repeated ids
/// keep their first occurrence.
pub fn parse_listing(html: &str, base_url: &Url) -> Vec<TopicLink> {
    let document = Html::parse_document(html);
    let mut topics = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return topics;
    };

    for element in document.select(&a_selector) {
        let is_new = element.value().classes().any(|class| class == "new");
        if !is_new {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(id) = topic_id(href) else {
            continue;
        };

        let Some(url) = resolve_link(href, base_url) else {
            continue;
        };

        if seen.insert(id) {
            topics.push(TopicLink { id, url });
        }
    }

    topics
}

/// Topic id from an href of the form `...topic=<id>.msg<n>...`
pub fn topic_id(href: &str) -> Option<i64> {
    TOPIC_HREF_REGEX
        .captures(href)
        .and_then(|caps| caps[1].parse().ok())
}

/// Extracts the page title up to the site separator
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .map(|text| {
            text.split(TITLE_SEPARATOR)
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
}

/// Text of the first element whose id carries the author marker
fn extract_author(document: &Html) -> Option<String> {
    let author_selector = Selector::parse(r#"[id*="author_"]"#).ok()?;

    document
        .select(&author_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Absolute link targets inside the post container
fn extract_post_links(post: ElementRef<'_>) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    post.select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| Url::parse(href.trim()).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .map(|url| url.to_string())
        .collect()
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, special schemes, fragments and anything
/// that does not resolve to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
