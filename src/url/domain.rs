use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fitment_harvester::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a host belongs to a bare domain
///
/// The bare domain itself and any subdomain of it match:
/// `example.com` matches `example.com`, `www.example.com` and
/// `cdn.img.example.com`, but not `myexample.com`.
pub fn host_matches(domain: &str, host: &str) -> bool {
    let host = host.to_lowercase();
    let domain = domain.to_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Checks whether a URL string points at the given bare domain
///
/// Unparseable URLs and URLs without a host (`about:blank`,
/// `chrome-error://chromewebdata/`) are never on the domain.
pub fn is_on_domain(url: &str, domain: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| extract_domain(&u))
        .map(|host| host_matches(domain, &host))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_host_matches_bare_and_subdomains() {
        assert!(host_matches("example.com", "example.com"));
        assert!(host_matches("example.com", "www.example.com"));
        assert!(host_matches("example.com", "cdn.img.example.com"));
        assert!(host_matches("example.com", "WWW.EXAMPLE.COM"));
    }

    #[test]
    fn test_host_matches_rejects_lookalikes() {
        assert!(!host_matches("example.com", "myexample.com"));
        assert!(!host_matches("example.com", "example.com.evil.org"));
        assert!(!host_matches("example.com", ""));
    }

    #[test]
    fn test_is_on_domain() {
        assert!(is_on_domain(
            "https://www.acurapartswarehouse.com/oem/acura~wheel.html",
            "acurapartswarehouse.com"
        ));
        assert!(!is_on_domain(
            "https://challenges.cloudflare.com/x",
            "acurapartswarehouse.com"
        ));
        assert!(!is_on_domain(
            "chrome-error://chromewebdata/",
            "acurapartswarehouse.com"
        ));
        assert!(!is_on_domain("not a url", "acurapartswarehouse.com"));
    }
}
