//! Request validation helpers.
//!
//! Domain rules shared by the REST and gRPC adapters. Inputs are checked
//! before any storage call is made; a failure is always
//! [`AppError::InvalidArgument`] naming the offending field.

use crate::AppError;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Validation entry point implemented by request input types.
pub trait ValidateExt {
    /// Validate the input.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidArgument`] describing the first violation.
    fn validate(&self) -> Result<(), AppError>;
}

/// Book title must contain something other than whitespace.
pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::invalid("title", "Title not found"));
    }
    Ok(())
}

/// Book year must be set.
pub fn validate_year(year: i32) -> Result<(), AppError> {
    if year == 0 {
        return Err(AppError::invalid("year", "Year not found"));
    }
    Ok(())
}

/// Listing limit must be non-negative.
pub fn validate_limit(limit: i64) -> Result<(), AppError> {
    if limit < 0 {
        return Err(AppError::invalid("limit", "Limit must not be negative"));
    }
    Ok(())
}

/// Parse a raw `limit` query value.
///
/// An absent or empty value means "no limit".
pub fn parse_limit(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            let limit = s
                .parse::<i64>()
                .map_err(|_| AppError::invalid("limit", "Invalid limit parameter"))?;
            validate_limit(limit)?;
            Ok(Some(limit))
        }
    }
}

/// Validate email format (basic shape check).
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::invalid("email", "Email is required"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(AppError::invalid(
            "email",
            format!("Email must not exceed {MAX_EMAIL_LENGTH} characters"),
        ));
    }

    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::invalid("email", "Invalid email format"));
    }

    Ok(())
}

/// Password must be present. No complexity rules apply.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::invalid("password", "Password is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_validation() {
        assert!(validate_title("Dune").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn test_year_validation() {
        assert!(validate_year(1965).is_ok());
        assert!(validate_year(-300).is_ok());
        assert!(validate_year(0).is_err());
    }

    #[test]
    fn test_limit_parsing() {
        assert_eq!(parse_limit(None).unwrap(), None);
        assert_eq!(parse_limit(Some("")).unwrap(), None);
        assert_eq!(parse_limit(Some("3")).unwrap(), Some(3));
        assert_eq!(parse_limit(Some("0")).unwrap(), Some(0));
        assert!(matches!(
            parse_limit(Some("abc")),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_limit(Some("-1")),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("nodomain").is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("pw").is_ok());
        assert!(validate_password("").is_err());
    }
}
