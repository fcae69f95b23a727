/// Derive a URL-safe identifier from a human-readable title: lowercase
/// ASCII alphanumerics with single hyphens between words, no leading or
/// trailing hyphen. Applying it to its own output is a no-op.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(
            slugify("Corruption Perceptions Index"),
            "corruption-perceptions-index"
        );
    }

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(slugify("  CPI -- 2024 (world)  "), "cpi-2024-world");
    }

    #[test]
    fn is_idempotent() {
        let once = slugify("Transparency International: CPI!");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn empty_and_symbol_only_input_yields_empty_slug() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
