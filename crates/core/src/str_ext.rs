//! String normalization helpers.

/// Canonical form of an email address used as the login key.
#[must_use]
pub fn canonical_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_email_trims_and_lowercases() {
        assert_eq!(canonical_email("  A@B.Com "), "a@b.com");
    }
}
