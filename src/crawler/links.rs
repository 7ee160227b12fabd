//! Link classification for post bodies
//!
//! Every URL found in a text lands in exactly one category. The categories
//! are tried in a fixed order (github, whitepaper, website, other) and the
//! first match wins, so a github repository URL is never counted as a plain
//! website.

use crate::state::ItemLinks;
use regex::Regex;
use std::sync::LazyLock;

/// Anything that looks like a link. Scheme-less `github.com/owner/repo` is
/// included because announcements often write repositories that way.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s<>"]+|www\.[^\s<>"]+|github\.com/[A-Za-z0-9_-]+/[A-Za-z0-9_.-]+"#)
        .expect("hardcoded regex pattern is valid")
});

static GITHUB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)github\.com/[A-Za-z0-9_-]+/[A-Za-z0-9_-]+")
        .expect("hardcoded regex pattern is valid")
});

static WHITEPAPER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)white[ _-]?paper|lite[ _-]?paper|technical[ _-]paper")
        .expect("hardcoded regex pattern is valid")
});

static WEBSITE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?://|www\.)[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("hardcoded regex pattern is valid")
});

/// Characters before a URL that count as its label ("Whitepaper: <url>")
const LABEL_CHARS: usize = 48;

/// Punctuation that ends a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', ')', ']', '\''];

/// Category of a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkCategory {
    Github,
    Whitepaper,
    Website,
    Other,
}

/// URLs of a text, grouped by category in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCategories {
    pub github: Vec<String>,
    pub whitepaper: Vec<String>,
    pub website: Vec<String>,
    pub other: Vec<String>,
}

impl LinkCategories {
    pub fn has_github(&self) -> bool {
        !self.github.is_empty()
    }

    pub fn has_whitepaper(&self) -> bool {
        !self.whitepaper.is_empty()
    }

    /// Total number of URLs found
    pub fn len(&self) -> usize {
        self.github.len() + self.whitepaper.len() + self.website.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First URL of each retained category
    pub fn representative(&self) -> ItemLinks {
        ItemLinks {
            github: self.github.first().cloned(),
            whitepaper: self.whitepaper.first().cloned(),
            website: self.website.first().cloned(),
        }
    }

    fn push(&mut self, category: LinkCategory, url: String) {
        match category {
            LinkCategory::Github => self.github.push(url),
            LinkCategory::Whitepaper => self.whitepaper.push(url),
            LinkCategory::Website => self.website.push(url),
            LinkCategory::Other => self.other.push(url),
        }
    }
}

/// Extracts and categorizes every URL in `text`
///
/// Pure and deterministic.
///
/// # Example
///
/// ```
/// use talkscan::crawler::classify_links;
///
/// let links = classify_links("Code: https://github.com/foo/bar site: https://foo.org");
/// assert_eq!(links.github, vec!["https://github.com/foo/bar"]);
/// assert_eq!(links.website, vec!["https://foo.org"]);
/// ```
pub fn classify_links(text: &str) -> LinkCategories {
    let mut categories = LinkCategories::default();
    let mut previous_end = 0;

    for m in URL_REGEX.find_iter(text) {
        let label = label_before(&text[previous_end..m.start()]);
        previous_end = m.end();

        let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if url.is_empty() {
            continue;
        }

        categories.push(categorize(url, label), url.to_string());
    }

    categories
}

/// Category of one URL given the text that introduces it on its line
pub fn categorize(url: &str, label: &str) -> LinkCategory {
    if GITHUB_REGEX.is_match(url) {
        LinkCategory::Github
    } else if WHITEPAPER_REGEX.is_match(url) || WHITEPAPER_REGEX.is_match(label) {
        LinkCategory::Whitepaper
    } else if WEBSITE_REGEX.is_match(url) {
        LinkCategory::Website
    } else {
        LinkCategory::Other
    }
}

/// Last `LABEL_CHARS` characters of the gap before a URL, current line only
fn label_before(gap: &str) -> &str {
    let line = gap.rsplit('\n').next().unwrap_or(gap);
    let skip = line.chars().count().saturating_sub(LABEL_CHARS);
    match line.char_indices().nth(skip) {
        Some((start, _)) => &line[start..],
        None => "",
    }
}
