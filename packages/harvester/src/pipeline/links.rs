//! Link discovery: feed programming-related outbound links back into
//! the frontier.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::frontier::{parse_valid_url, Frontier};

/// Hosts (and their subdomains) that are always considered technical.
pub const TECHNICAL_DOMAINS: &[&str] = &[
    "stackoverflow.com",
    "github.com",
    "dev.to",
    "medium.com",
    "realpython.com",
    "javascript.info",
    "python.org",
    "developer.mozilla.org",
    "docs.oracle.com",
    "baeldung.com",
    "javacodegeeks.com",
    "cplusplus.com",
    "cppreference.com",
    "isocpp.org",
    "tc39.es",
    "rust-lang.org",
    "docs.rs",
    "go.dev",
    "geeksforgeeks.org",
    "w3schools.com",
];

/// Substrings of a lowercased URL that mark it as programming-related.
pub const PROGRAMMING_KEYWORDS: &[&str] = &[
    "programming",
    "python",
    "javascript",
    "java",
    "cpp",
    "rust",
    "golang",
    "tutorial",
    "docs",
    "documentation",
    "reference",
    "api",
    "algorithm",
    "code",
    "developer",
    "library",
    "framework",
];

/// Scans fetched pages for links worth crawling next.
pub struct LinkDiscoverer {
    frontier: Arc<Frontier>,
}

impl LinkDiscoverer {
    pub fn new(frontier: Arc<Frontier>) -> Self {
        Self { frontier }
    }

    /// Enqueue every programming-related link in `content`.
    ///
    /// Returns the number of links the frontier admitted.
    pub fn discover(&self, content: &str, source_url: &str) -> usize {
        let Some(base) = parse_valid_url(source_url) else {
            debug!(url = %source_url, "source URL invalid, skipping link discovery");
            return 0;
        };

        let admitted = extract_links(&base, content)
            .into_iter()
            .filter(|link| is_programming_related(link))
            .filter(|link| self.frontier.enqueue(link.as_str()))
            .count();

        debug!(url = %source_url, admitted, "discovered links");
        admitted
    }
}

/// Resolve every `href` value in `content` against `base`.
pub fn extract_links(base: &Url, content: &str) -> Vec<Url> {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let pattern = HREF.get_or_init(|| {
        Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("href pattern is valid")
    });

    pattern
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim())
        .filter(|href| {
            !(href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:"))
        })
        .filter_map(|href| base.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .collect()
}

/// Whitelisted host, or a programming keyword anywhere in the URL.
pub fn is_programming_related(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let on_whitelist = TECHNICAL_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));

    on_whitelist || {
        let lowered = url.as_str().to_lowercase();
        PROGRAMMING_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_extract_links_resolves_and_skips() {
        let base = url("https://docs.python.org/3/tutorial/index.html");
        let html = r##"
            <a href="/3/library/">Library</a>
            <a href="classes.html">Classes</a>
            <a href='https://realpython.com/'>Real Python</a>
            <a href="#section">Anchor</a>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:docs@python.org">Mail</a>
            <a href="ftp://files.python.org/pub">FTP</a>
        "##;

        let links: Vec<String> = extract_links(&base, html)
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            links,
            vec![
                "https://docs.python.org/3/library/",
                "https://docs.python.org/3/tutorial/classes.html",
                "https://realpython.com/",
            ]
        );
    }

    #[test]
    fn test_is_programming_related() {
        assert!(is_programming_related(&url("https://stackoverflow.com/q/1")));
        assert!(is_programming_related(&url("https://en.cppreference.com/w/")));
        assert!(is_programming_related(&url("https://blog.example.com/python-tips")));
        assert!(!is_programming_related(&url("https://news.example.com/sports")));
        assert!(!is_programming_related(&url("https://notgithub.com/")));
    }

    #[test]
    fn test_discover_enqueues_relevant_links_once() {
        let frontier = Arc::new(Frontier::new(100));
        let discoverer = LinkDiscoverer::new(frontier.clone());
        let html = r#"
            <a href="https://github.com/rust-lang/rust">Rust</a>
            <a href="https://github.com/rust-lang/rust">Rust again</a>
            <a href="https://weather.example.com/today">Weather</a>
            <a href="/docs/intro">Intro</a>
        "#;

        let admitted = discoverer.discover(html, "https://shop.example.com/page");

        assert_eq!(admitted, 2);
        assert!(frontier.is_queued("https://github.com/rust-lang/rust"));
        assert!(frontier.is_queued("https://shop.example.com/docs/intro"));
        assert!(!frontier.is_queued("https://weather.example.com/today"));
    }

    #[test]
    fn test_discover_skips_seen_urls() {
        let frontier = Arc::new(Frontier::new(100));
        frontier.mark_seen("https://dev.to/post");
        let discoverer = LinkDiscoverer::new(frontier.clone());

        let admitted = discoverer.discover(r#"<a href="https://dev.to/post">x</a>"#, "https://dev.to/");

        assert_eq!(admitted, 0);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_invalid_source_url() {
        let discoverer = LinkDiscoverer::new(Arc::new(Frontier::default()));
        assert_eq!(discoverer.discover(r#"<a href="/x">x</a>"#, "not a url"), 0);
    }
}
