//! Slug normalization for film and person titles.
//!
//! Uniqueness is the store's concern (it appends `-1`, `-2`, ... on
//! collision); this module only produces the base form.

/// Normalize a title into a URL slug: lowercase ASCII alphanumerics with
/// single dashes between words.
///
/// Returns `"untitled"` when nothing usable remains, so a slug is never
/// empty.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_dash = true; // suppress a leading dash

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("untitled");
    }

    slug
}

/// The candidate slug for the given disambiguation attempt: the base slug
/// itself first, then `base-1`, `base-2`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}
