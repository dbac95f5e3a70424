//! Slug derivation for public post URLs.

/// Derive a URL-safe slug from a post title.
///
/// Lowercases, transliterates diacritics to ASCII, collapses every run of
/// non-alphanumeric characters to a single `-` and trims separators at both
/// ends. Titles without any alphanumeric character yield an empty string,
/// which validation then rejects.
pub fn derive_slug(title: &str) -> String {
    slug::slugify(title)
}

/// Shape check for caller-supplied slugs: lowercase kebab-case, no edge or
/// doubled separators.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
