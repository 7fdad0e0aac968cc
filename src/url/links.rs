use url::Url;

/// Path extensions accepted as article pages
const HTML_LIKE_EXTENSIONS: &[&str] = &["html", "htm", "shtml", "xhtml"];

/// Turns an anchor `href` into a candidate article URL
///
/// Root-relative hrefs (a single leading `/`) are prefixed with the site's
/// base URL; scheme-relative hrefs (`//host/...`) take the base URL's scheme.
/// Anything else is returned trimmed but otherwise untouched, and is left for
/// the same-site check to accept or reject.
pub fn resolve_href(href: &str, base_url: &str) -> String {
    let href = href.trim();

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = base_url.split_once("://").map(|(s, _)| s).unwrap_or("https");
        return format!("{}://{}", scheme, rest);
    }

    if href.starts_with('/') {
        return format!("{}{}", base_url.trim_end_matches('/'), href);
    }

    href.to_string()
}

/// Checks whether a URL points at something that looks like an HTML page
///
/// The last path segment must either carry no extension at all or one of the
/// HTML-like extensions. Strings that do not parse as absolute URLs are never
/// pages.
///
/// # Examples
///
/// ```
/// use wordwatch::url::has_page_extension;
///
/// assert!(has_page_extension("https://example.com/news/story"));
/// assert!(has_page_extension("https://example.com/news/story.html?ref=home"));
/// assert!(!has_page_extension("https://example.com/files/report.pdf"));
/// assert!(!has_page_extension("news/story.html"));
/// ```
pub fn has_page_extension(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    let last_segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rsplit_once('.') {
        None => true,
        Some((_, extension)) => HTML_LIKE_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed)),
    }
}

/// Same-site heuristic: the candidate must contain the base URL verbatim
pub fn is_same_site(candidate: &str, base_url: &str) -> bool {
    candidate.contains(base_url)
}

/// Applies the full article-link policy to one `href`
///
/// Returns the resolved URL when the href qualifies as an article link.
pub fn qualify_article_href(href: &str, base_url: &str) -> Option<String> {
    if href.trim().is_empty() {
        return None;
    }

    let candidate = resolve_href(href, base_url);
    if has_page_extension(&candidate) && is_same_site(&candidate, base_url) {
        Some(candidate)
    } else {
        None
    }
}
