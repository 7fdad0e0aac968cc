use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wordwatch::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives a site name from its front page URL
///
/// The leading `www.` is dropped and the first remaining host label is kept,
/// so `https://www.nytimes.com/` becomes `nytimes`. Hosts that are IP
/// addresses are kept whole.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wordwatch::url::site_name_from_url;
///
/// let url = Url::parse("https://www.Spiegel.de/").unwrap();
/// assert_eq!(site_name_from_url(&url), Some("spiegel".to_string()));
/// ```
pub fn site_name_from_url(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;

    if matches!(url.host(), Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_))) {
        return Some(host);
    }

    let host = host.strip_prefix("www.").unwrap_or(&host);
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}
