/// URL path and locale tag validation.
///
/// Conventions:
/// - Locales are BCP-47-like `language-REGION` tags (`en-GB`, `fr-FR`).
/// - Paths are stored without leading or trailing slashes (`about/team`).
/// - The empty string is a valid path: it denotes the locale's homepage.

/// Check a `language-REGION` tag: 2–3 lowercase letters, a hyphen,
/// 2 uppercase letters.
pub fn is_valid_locale(tag: &str) -> bool {
    let Some((language, region)) = tag.split_once('-') else {
        return false;
    };
    (2..=3).contains(&language.len())
        && language.bytes().all(|b| b.is_ascii_lowercase())
        && region.len() == 2
        && region.bytes().all(|b| b.is_ascii_uppercase())
}

/// Check a canonical URL path: empty (homepage) or slash-separated segments
/// of lowercase alphanumerics and hyphens. No leading, trailing or doubled
/// slashes.
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    path.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    })
}

/// Check a post slug: a single non-empty path segment.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && is_valid_path(slug) && !slug.contains('/')
}
