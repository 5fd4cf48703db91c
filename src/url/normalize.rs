use url::form_urlencoded;
use url::Url;

/// Normalizes a URL for consistent comparison and deduplication
///
/// # Normalization Steps
///
/// 1. Lowercase the scheme and host (the parser does this)
/// 2. Strip default ports (:80 for http, :443 for https)
/// 3. Decode superfluous percent-encoding in the path
/// 4. Strip the trailing slash from non-root paths
/// 5. Remove the fragment
/// 6. Sort query parameters lexicographically by key
/// 7. Drop an empty query string
///
/// The result is for comparison and deduplication only; requests go out
/// with the original URL. A string that does not parse as a URL is
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use linkscope::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("HTTP://Example.com:80/Path/?b=2&a=1"),
///     normalize_url("http://example.com/Path?a=1&b=2"),
/// );
/// ```
pub fn normalize_url(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(u) => u,
        Err(_) => return url_str.to_string(),
    };

    let path = decode_superfluous_encoding(url.path());
    let path = strip_trailing_slash(&path);
    url.set_path(&path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        // Stable sort: duplicate keys keep their original relative order
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish();
            url.set_query(Some(&query));
        }
    }

    url.to_string()
}

/// Checks whether a redirect is purely canonical
///
/// A canonical redirect differs from its source only by trailing slash,
/// path case, or scheme — not a true content move. True iff the hosts match
/// (ports ignored), the paths match case-insensitively after stripping a
/// trailing slash, and the query strings are byte-identical.
pub fn is_canonical_redirect(source_url: &str, dest_url: &str) -> bool {
    let (source, dest) = match (Url::parse(source_url), Url::parse(dest_url)) {
        (Ok(s), Ok(d)) => (s, d),
        _ => return false,
    };

    match (source.host_str(), dest.host_str()) {
        (Some(s), Some(d)) if s.eq_ignore_ascii_case(d) => {}
        _ => return false,
    }

    let source_path = source.path().to_lowercase();
    let dest_path = dest.path().to_lowercase();
    if source_path.trim_end_matches('/') != dest_path.trim_end_matches('/') {
        return false;
    }

    source.query() == dest.query()
}

/// Decodes %XX sequences whose decoded byte never needed encoding
/// (unreserved characters and `/`); everything else is left intact.
fn decode_superfluous_encoding(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = &path[i + 1..i + 3];
            if let Ok(value) = u8::from_str_radix(hex, 16) {
                let c = value as char;
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~' | '/') {
                    out.push(c);
                    i += 3;
                    continue;
                }
            }
        }
        // Safe: we only ever skip complete ASCII %XX sequences
        let c = path[i..].chars().next().unwrap();
        out.push(c);
        i += c.len_utf8();
    }

    out
}

fn strip_trailing_slash(path: &str) -> String {
    if path.len() > 1 && path.ends_with('/') {
        path[..path.len() - 1].to_string()
    } else {
        path.to_string()
    }
}
