//! Container-name derivation from human-readable project names.

/// Fallback when the input contains no usable characters at all.
pub const FALLBACK_SLUG: &str = "project";

/// Convert a project name into a container-friendly slug.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, strips leading/trailing separators, and falls back to
/// [`FALLBACK_SLUG`] for empty or all-punctuation input.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}
