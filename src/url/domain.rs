use url::Url;

/// Extracts the host from a URL, lowercased
///
/// Ports are not part of the key, so `example.com:8080` and `example.com`
/// share one pacing slot.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_seek::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
