use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};

use crate::model::UserContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Axum extractor for the caller recorded as `updatedBy`.
///
/// Reads `X-User-Id` and the optional `X-User-Name`. Requests without an id
/// run as the development user.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(user_from_headers(&parts.headers))
    }
}

fn user_from_headers(headers: &HeaderMap) -> UserContext {
    match header_value(headers, USER_ID_HEADER) {
        Some(user_id) => UserContext::with_name(user_id, header_value(headers, USER_NAME_HEADER)),
        None => UserContext::default_user(),
    }
}

fn header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_user_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("u-42"),
        );
        let user = user_from_headers(&headers);
        assert_eq!(user.user_id, "u-42");
        assert_eq!(user.audit_name(), "u-42");

        headers.insert(
            HeaderName::from_static(USER_NAME_HEADER),
            HeaderValue::from_static("Ada"),
        );
        assert_eq!(user_from_headers(&headers).audit_name(), "Ada");
    }

    #[test]
    fn test_missing_or_blank_id_falls_back() {
        assert_eq!(user_from_headers(&HeaderMap::new()), UserContext::default_user());

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_static("  "),
        );
        assert_eq!(user_from_headers(&headers), UserContext::default_user());
    }
}
