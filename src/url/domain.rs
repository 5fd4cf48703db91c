use url::Url;

/// Compound public suffixes that take a third label for the registrable domain
const COMPOUND_SUFFIXES: &[&str] = &[
    "co.uk", "com.au", "co.nz", "co.za", "com.br", "co.jp", "co.kr",
];

/// Schemes that can never be fetched over HTTP
const SKIP_SCHEMES: &[&str] = &[
    "mailto:", "tel:", "javascript:", "data:", "file:", "ftp:", "ssh:",
];

/// Extracts the host key of a URL: the lowercase host, plus the port when
/// one is explicitly present. Used to key per-host state (rate limiter,
/// HEAD blacklist), where `example.com:8080` and `example.com` are
/// different servers.
pub fn host_key(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Extracts the registrable (root) domain from a host
///
/// Strips subdomain labels down to two, or three when the last two labels
/// form a compound public suffix.
///
/// # Examples
///
/// ```
/// use linkscope::url::root_domain;
///
/// assert_eq!(root_domain("blog.example.com"), "example.com");
/// assert_eq!(root_domain("www.example.co.uk"), "example.co.uk");
/// ```
pub fn root_domain(host: &str) -> String {
    let host = host.split(':').next().unwrap_or(host).to_lowercase();
    let parts: Vec<&str> = host.split('.').collect();

    if parts.len() <= 2 {
        return host;
    }

    let last_two = parts[parts.len() - 2..].join(".");
    if COMPOUND_SUFFIXES.contains(&last_two.as_str()) {
        return parts[parts.len() - 3..].join(".");
    }

    last_two
}

/// Determines whether a link is internal to the base URL's site
///
/// An exact host match (ports ignored) is always internal. With
/// `include_subdomains`, a registrable-domain match also counts.
pub fn is_internal_link(link_url: &str, base_url: &str, include_subdomains: bool) -> bool {
    let link_host = match Url::parse(link_url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
        Some(h) => h,
        None => return false,
    };
    let base_host = match Url::parse(base_url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
        Some(h) => h,
        None => return false,
    };

    if link_host == base_host {
        return true;
    }

    include_subdomains && root_domain(&link_host) == root_domain(&base_host)
}

/// Checks whether a string is a fetchable HTTP(S) URL
pub fn is_valid_http_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Determines whether an href should be skipped outright: empty strings,
/// pure fragments, and non-fetchable schemes.
pub fn should_skip_link(href: &str) -> bool {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return true;
    }

    let lower = href.to_lowercase();
    SKIP_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Resolves a (possibly relative) href against a page URL
///
/// Returns `None` for skippable hrefs and resolution failures; any fragment
/// on the resolved URL is dropped.
pub fn resolve_relative_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();

    if should_skip_link(href) {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_simple() {
        assert_eq!(
            host_key("https://Example.COM/page"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_host_key_with_port() {
        assert_eq!(
            host_key("http://127.0.0.1:4545/page"),
            Some("127.0.0.1:4545".to_string())
        );
    }

    #[test]
    fn test_host_key_invalid() {
        assert_eq!(host_key("not a url"), None);
    }

    #[test]
    fn test_root_domain_plain() {
        assert_eq!(root_domain("example.com"), "example.com");
    }

    #[test]
    fn test_root_domain_subdomain() {
        assert_eq!(root_domain("blog.example.com"), "example.com");
        assert_eq!(root_domain("a.b.example.com"), "example.com");
    }

    #[test]
    fn test_root_domain_compound_suffix() {
        assert_eq!(root_domain("www.example.co.uk"), "example.co.uk");
        assert_eq!(root_domain("shop.example.com.au"), "example.com.au");
    }

    #[test]
    fn test_root_domain_strips_port() {
        assert_eq!(root_domain("blog.example.com:8080"), "example.com");
    }

    #[test]
    fn test_internal_exact_host() {
        assert!(is_internal_link(
            "https://example.com/about",
            "https://example.com/",
            false
        ));
    }

    #[test]
    fn test_subdomain_external_by_default() {
        assert!(!is_internal_link(
            "https://blog.example.com/post",
            "https://example.com/",
            false
        ));
    }

    #[test]
    fn test_subdomain_internal_when_included() {
        assert!(is_internal_link(
            "https://blog.example.com/post",
            "https://example.com/",
            true
        ));
    }

    #[test]
    fn test_other_domain_always_external() {
        assert!(!is_internal_link(
            "https://other.com/",
            "https://example.com/",
            true
        ));
    }

    #[test]
    fn test_is_valid_http_url() {
        assert!(is_valid_http_url("https://example.com/page"));
        assert!(is_valid_http_url("http://example.com"));
        assert!(!is_valid_http_url("ftp://example.com"));
        assert!(!is_valid_http_url("/relative/path"));
        assert!(!is_valid_http_url(""));
    }

    #[test]
    fn test_should_skip_link() {
        assert!(should_skip_link(""));
        assert!(should_skip_link("#top"));
        assert!(should_skip_link("mailto:a@b.com"));
        assert!(should_skip_link("tel:+123456"));
        assert!(should_skip_link("javascript:void(0)"));
        assert!(should_skip_link("JavaScript:void(0)"));
        assert!(should_skip_link("data:text/plain,hi"));
        assert!(should_skip_link("ftp://example.com/file"));
        assert!(!should_skip_link("/about"));
        assert!(!should_skip_link("https://example.com/"));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative_url("https://example.com/a/b", "../c"),
            Some("https://example.com/c".to_string())
        );
        assert_eq!(
            resolve_relative_url("https://example.com/a/", "page"),
            Some("https://example.com/a/page".to_string())
        );
    }

    #[test]
    fn test_resolve_strips_fragment() {
        assert_eq!(
            resolve_relative_url("https://example.com/", "/page#section"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_resolve_skips_non_fetchable() {
        assert_eq!(resolve_relative_url("https://example.com/", "#top"), None);
        assert_eq!(
            resolve_relative_url("https://example.com/", "mailto:a@b.com"),
            None
        );
    }
}
