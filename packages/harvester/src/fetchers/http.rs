//! HTTP page fetcher.
//!
//! Fetches a single page with reqwest and converts its HTML to plain
//! text, keeping headings, paragraph breaks and fenced code blocks.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::traits::fetcher::{FetchedPage, PageFetcher};

/// Default per-request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP fetcher backed by reqwest.
///
/// # Example
///
/// ```rust,ignore
/// use harvester::fetchers::HttpFetcher;
///
/// let fetcher = HttpFetcher::new().with_timeout(Duration::from_secs(10));
/// let text = fetcher.fetch_text(&url).await;
/// ```
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with a 30s timeout.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: "HarvesterBot/1.0 (+programming knowledge)".to_string(),
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<FetchedPage> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "HTTP fetch rejected");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map_or(true, |ct| ct.contains("html"));

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, e))?;

        if !is_html {
            let text = body.trim().to_string();
            if text.is_empty() {
                return Err(FetchError::Empty {
                    url: url.to_string(),
                });
            }
            return Ok(FetchedPage::new(final_url, text));
        }

        let text = html_to_text(&body);
        if text.is_empty() {
            return Err(FetchError::Empty {
                url: url.to_string(),
            });
        }

        debug!(url = %final_url, content_length = text.len(), "page fetched");
        let mut page = FetchedPage::new(final_url, text).with_html(body.as_str());
        if let Some(title) = extract_title(&body) {
            page = page.with_title(title);
        }
        Ok(page)
    }
}

fn transport_error(url: &Url, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http(Box::new(e))
    }
}

struct HtmlPatterns {
    script: Regex,
    style: Regex,
    pre: Regex,
    heading: Regex,
    paragraph: Regex,
    line_break: Regex,
    list_item: Regex,
    tag: Regex,
    blank_lines: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("HTML pattern is valid");
        HtmlPatterns {
            script: re(r"(?is)<script[^>]*>.*?</script>"),
            style: re(r"(?is)<style[^>]*>.*?</style>"),
            pre: re(r#"(?is)<pre[^>]*>\s*(?:<code(?:[^>]*class=["'](?:[^"']*\s)?language-([a-z0-9+#-]+)[^"']*["'])?[^>]*>)?(.*?)(?:</code>\s*)?</pre>"#),
            heading: re(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>"),
            paragraph: re(r"(?is)<p[^>]*>(.*?)</p>"),
            line_break: re(r"(?i)<br\s*/?>"),
            list_item: re(r"(?is)<li[^>]*>(.*?)</li>"),
            tag: re(r"<[^>]+>"),
            blank_lines: re(r"\n\s*\n(\s*\n)+"),
        }
    })
}

/// Convert HTML to readable text.
///
/// `<pre>` blocks become fenced code blocks so code survives extraction.
pub fn html_to_text(html: &str) -> String {
    let p = patterns();

    let text = p.script.replace_all(html, "");
    let text = p.style.replace_all(&text, "");
    let text = p.pre.replace_all(&text, |caps: &regex::Captures| {
        let lang = caps.get(1).map_or("", |m| m.as_str());
        let code = caps.get(2).map_or("", |m| m.as_str()).trim_matches('\n');
        format!("\n```{lang}\n{code}\n```\n")
    });
    let text = p.heading.replace_all(&text, |caps: &regex::Captures| {
        let level = caps[1].parse::<usize>().unwrap_or(1);
        format!("\n{} {}\n", "#".repeat(level), caps[2].trim())
    });
    let text = p.paragraph.replace_all(&text, "$1\n\n");
    let text = p.line_break.replace_all(&text, "\n");
    let text = p.list_item.replace_all(&text, "- $1\n");
    let text = p.tag.replace_all(&text, "");
    let text = p.blank_lines.replace_all(&text, "\n\n");

    decode_entities(&text).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Extract the `<title>` of an HTML document.
pub fn extract_title(html: &str) -> Option<String> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let pattern =
        TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"));
    pattern
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"
            <html><head><style>body { color: red; }</style></head>
            <body>
            <script>alert("hi")</script>
            <h1>List comprehensions</h1>
            <p>Build lists <b>concisely</b> &amp; clearly.</p>
            <ul><li>fast</li><li>readable</li></ul>
            </body></html>
        "#;

        let text = html_to_text(html);

        assert!(text.starts_with("# List comprehensions"));
        assert!(text.contains("Build lists concisely & clearly."));
        assert!(text.contains("- fast\n"));
        assert!(!text.contains("alert"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_pre_blocks_become_fenced_code() {
        let html = r#"<p>Example:</p><pre><code class="language-python">squares = [x * x for x in range(10)]
print(squares)</code></pre>"#;

        let text = html_to_text(html);

        assert!(text.contains("```python\nsquares = [x * x for x in range(10)]\nprint(squares)\n```"));
    }

    #[test]
    fn test_pre_without_language() {
        let text = html_to_text("<pre>let x = 1 &lt; 2;</pre>");
        assert_eq!(text, "```\nlet x = 1 < 2;\n```");
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title> Python &amp; You </title></head></html>";
        assert_eq!(extract_title(html), Some("Python & You".to_string()));
        assert_eq!(extract_title("<html><body>No title</body></html>"), None);
    }

    #[tokio::test]
    async fn test_rejects_non_http_scheme() {
        let fetcher = HttpFetcher::new();
        let url = Url::parse("ftp://files.example.com/x").unwrap();

        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(FetchError::InvalidUrl { .. })
        ));
        assert_eq!(fetcher.fetch_text(&url).await, None);
    }
}
