use crate::UrlError;
use url::Url;

/// Normalizes a discovered link into its catalog identity
///
/// # Normalization Steps
///
/// 1. Trim and reject empty, fragment-only and non-navigational hrefs
///    (`javascript:`, `mailto:`, `tel:`, `data:`)
/// 2. Resolve relative and protocol-relative hrefs against `base`
/// 3. Reject anything that is not HTTP(S) after resolution
/// 4. Remove the fragment
/// 5. Remove the whole query string
/// 6. Remove trailing slashes (including the root slash)
///
/// Two links that differ only in fragment, query or trailing slash normalize
/// to the same string, which is what makes discovery deduplication work.
///
/// # Examples
///
/// ```
/// use fitment_harvester::url::normalize_discovered_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com").unwrap();
/// let url = normalize_discovered_url("/oem-acura-rims.html?page=2#top", &base).unwrap();
/// assert_eq!(url, "https://www.example.com/oem-acura-rims.html");
/// ```
pub fn normalize_discovered_url(href: &str, base: &Url) -> Result<String, UrlError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Parse(format!("Not a navigable link: '{}'", href)));
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return Err(UrlError::InvalidScheme(href.to_string()));
    }

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    url.set_query(None);

    let normalized = url.to_string();
    Ok(normalized.trim_end_matches('/').to_string())
}

/// Resolves a possibly relative or protocol-relative resource URL to absolute form
///
/// Unlike [`normalize_discovered_url`] the query string is kept, since image
/// CDNs commonly encode size variants in it.
pub fn absolutize(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }

    let resolved = if let Some(rest) = href.strip_prefix("//") {
        Url::parse(&format!("https://{}", rest)).ok()?
    } else {
        base.join(href).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
