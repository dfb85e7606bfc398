use crate::UrlError;
use url::Url;

/// Returns true for the schemes the crawler will fetch
pub fn is_crawlable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Normalizes a URL into the crawler's dedup key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http or https
/// 3. Lowercase the scheme and host
/// 4. Remove the fragment (everything after #)
///
/// Path, query and port are kept as they are; an empty path becomes `/`.
/// Two URLs are the same page exactly when their normalized strings are equal.
///
/// # Examples
///
/// ```
/// use sumi_seek::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM/Page#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/Page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_crawlable_scheme(&url) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();

    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_scheme_and_host() {
        let result = normalize_url("HTTPS://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keeps_scheme() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_keeps_trailing_slash_and_query() {
        let result = normalize_url("https://example.com/page/?b=2&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page/?b=2&a=1");
    }

    #[test]
    fn test_keeps_port() {
        let result = normalize_url("http://127.0.0.1:8080/a").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/a");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_trims_whitespace() {
        let result = normalize_url("  https://example.com/x \n").unwrap();
        assert_eq!(result.as_str(), "https://example.com/x");
    }

    #[test]
    fn test_same_page_variants_collapse() {
        let a = normalize_url("https://Example.com/wiki/Rust#History").unwrap();
        let b = normalize_url("https://example.COM/wiki/Rust").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));

        let result = normalize_url("mailto:someone@example.com");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        let result = normalize_url("not a url");
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_url("HTTP://WWW.Example.com/A?x=1#frag").unwrap();
        let twice = normalize_url(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }
}
