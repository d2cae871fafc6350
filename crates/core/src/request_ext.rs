//! Extension traits for extracting bearer credentials from requests.
//!
//! Both transports carry the session token the same way: an `authorization`
//! header (HTTP) or metadata entry (gRPC) holding `Bearer <token>`.
//!
//! ```ignore
//! use library_core::BearerExt;
//!
//! async fn add_book(&self, request: Request<AddBookRequest>) -> Result<Response<Book>, Status> {
//!     let token = request.bearer_token()?;
//!     // ...
//! }
//! ```

use http::HeaderMap;
use tonic::Request;

use crate::AppError;

/// Scheme prefix of the `authorization` value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Build the `authorization` value for an issued token.
#[must_use]
pub fn bearer_value(token: &str) -> String {
    format!("{BEARER_PREFIX}{token}")
}

/// Parse a raw `authorization` value into the bare token.
fn parse_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let header =
        header.ok_or_else(|| AppError::Unauthenticated("Missing authorization".to_string()))?;

    header
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Invalid authorization format".to_string()))
}

/// Extension trait for extracting a bearer token from call metadata.
pub trait BearerExt {
    /// Whether the caller supplied any `authorization` value.
    fn has_authorization(&self) -> bool;

    /// Extract the bearer token.
    ///
    /// # Errors
    /// Returns [`AppError::Unauthenticated`] if the value is missing or malformed.
    fn bearer_token(&self) -> Result<&str, AppError>;
}

impl BearerExt for HeaderMap {
    fn has_authorization(&self) -> bool {
        self.contains_key(http::header::AUTHORIZATION)
    }

    fn bearer_token(&self) -> Result<&str, AppError> {
        parse_bearer(
            self.get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
        )
    }
}

impl<T> BearerExt for Request<T> {
    fn has_authorization(&self) -> bool {
        self.metadata().contains_key("authorization")
    }

    fn bearer_token(&self) -> Result<&str, AppError> {
        parse_bearer(
            self.metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grpc_request(value: Option<&str>) -> Request<()> {
        let mut req = Request::new(());
        if let Some(value) = value {
            req.metadata_mut()
                .insert("authorization", value.parse().unwrap());
        }
        req
    }

    #[test]
    fn extracts_token_from_grpc_metadata() {
        let req = grpc_request(Some("Bearer abc-123"));
        assert_eq!(req.bearer_token().unwrap(), "abc-123");
    }

    #[test]
    fn accepts_lowercase_scheme() {
        let req = grpc_request(Some("bearer abc-123"));
        assert_eq!(req.bearer_token().unwrap(), "abc-123");
    }

    #[test]
    fn missing_metadata_is_unauthenticated() {
        let req = grpc_request(None);
        assert!(!req.has_authorization());
        assert!(matches!(
            req.bearer_token(),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn wrong_scheme_is_unauthenticated() {
        let req = grpc_request(Some("Basic dXNlcjpwYXNz"));
        assert!(req.has_authorization());
        assert!(matches!(
            req.bearer_token(),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn empty_token_is_unauthenticated() {
        let req = grpc_request(Some("Bearer "));
        assert!(req.bearer_token().is_err());
    }

    #[test]
    fn extracts_token_from_http_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            bearer_value("tok").parse().unwrap(),
        );
        assert_eq!(headers.bearer_token().unwrap(), "tok");
    }
}
