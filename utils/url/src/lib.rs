//! URL helpers shared by the cache (fingerprints) and the search engine
//! (de-duplication, resolving relative result links).

use url::Url;

/// Normalize a URL so that trivially different spellings compare equal.
///
/// Scheme and host are lowercased and default ports dropped by the parser;
/// the fragment and any trailing slash on a non-root path are removed.
/// Strings that do not parse as URLs are only trimmed.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}

/// Resolve a possibly relative link against `base`.
///
/// Absolute http(s) links are returned unchanged; `/path` and `path` are
/// joined onto the base origin. Returns `None` for empty links or links that
/// cannot be resolved.
pub fn resolve_url(base: &str, link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(link) {
        return matches!(url.scheme(), "http" | "https").then(|| url.to_string());
    }

    let base = Url::parse(base.trim()).ok()?;
    let joined = if link.starts_with('/') {
        base.join(link)
    } else {
        base.join(&format!("/{link}"))
    };
    joined.ok().map(String::from)
}

/// Host of a URL, lowercased.
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// Whether `host` equals `domain` or is one of its subdomains.
pub fn host_in_domain(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
    !domain.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}
