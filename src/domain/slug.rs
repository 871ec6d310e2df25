//! Public profile slug rules.

/// Slugs the platform keeps for itself.
const RESERVED: &[&str] = &[
    "admin", "api", "www", "app", "support", "help", "blog", "about", "login", "signup",
    "settings", "public", "profile", "static", "f01i", "flowinvest",
];

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 30;

/// Checks slug format: 3–30 lowercase ASCII alphanumerics and hyphens,
/// no edge or double hyphens, not a reserved word.
///
/// # Errors
///
/// Returns a human-readable reason when the slug is malformed.
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.len() < MIN_LEN || slug.len() > MAX_LEN {
        return Err(format!(
            "slug must be between {MIN_LEN} and {MAX_LEN} characters"
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("slug may only contain lowercase letters, digits and hyphens".to_string());
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("slug may not start or end with a hyphen".to_string());
    }
    if slug.contains("--") {
        return Err("slug may not contain consecutive hyphens".to_string());
    }
    if RESERVED.contains(&slug) {
        return Err("this slug is reserved".to_string());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_slugs_pass() {
        assert!(validate_slug("satoshi").is_ok());
        assert!(validate_slug("my-trading-page-42").is_ok());
        assert!(validate_slug("abc").is_ok());
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(validate_slug("ab").is_err());
        assert!(validate_slug(&"a".repeat(31)).is_err());
        assert!(validate_slug(&"a".repeat(30)).is_ok());
    }

    #[test]
    fn uppercase_and_symbols_are_rejected() {
        assert!(validate_slug("Satoshi").is_err());
        assert!(validate_slug("satoshi!").is_err());
        assert!(validate_slug("satoshi nakamoto").is_err());
    }

    #[test]
    fn hyphen_placement_is_enforced() {
        assert!(validate_slug("-satoshi").is_err());
        assert!(validate_slug("satoshi-").is_err());
        assert!(validate_slug("sato--shi").is_err());
    }

    #[test]
    fn reserved_words_are_rejected() {
        assert!(validate_slug("admin").is_err());
        assert!(validate_slug("f01i").is_err());
        // but only exact matches
        assert!(validate_slug("admin-fan").is_ok());
    }
}
