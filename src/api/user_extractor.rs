use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::api::extract::invalid_argument;
use crate::api::handlers::ApiError;
use crate::model::{Id, Permissions, UserContext};

/// Axum extractor for UserContext from request headers
///
/// The auth layer in front of this service sets:
/// - X-User-Id: numeric id of the logged-in user
/// - X-User-Permissions: comma-separated permission flags, e.g. `wiki_edit`
///
/// Requests without X-User-Id are anonymous. A malformed id is rejected.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let Some(raw_id) = extract_header_value(headers, "x-user-id") else {
            return Ok(UserContext::anonymous());
        };
        let user_id: Id = raw_id
            .trim()
            .parse()
            .map_err(|_| invalid_argument(format!("malformed x-user-id {:?}", raw_id)))?;

        let permissions = extract_header_value(headers, "x-user-permissions")
            .map(|raw| Permissions::parse(&raw))
            .unwrap_or_default();

        Ok(UserContext::with_permissions(user_id, permissions))
    }
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(request: Request<()>) -> Result<UserContext, ApiError> {
        let (mut parts, _) = request.into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_user_context_extraction() {
        let request = Request::builder()
            .header("x-user-id", "42")
            .header("x-user-permissions", "subject_lock, wiki_edit")
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.user_id, Some(42));
        assert!(ctx.permissions.wiki_edit);
        assert_eq!(ctx.wiki_editor_id(), Some(42));
    }

    #[tokio::test]
    async fn test_missing_headers_are_anonymous() {
        let ctx = extract(Request::builder().body(()).unwrap()).await.unwrap();
        assert_eq!(ctx, UserContext::anonymous());
        assert_eq!(ctx.wiki_editor_id(), None);
    }

    #[tokio::test]
    async fn test_user_without_permission_cannot_edit() {
        let request = Request::builder().header("x-user-id", "7").body(()).unwrap();
        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.user_id, Some(7));
        assert_eq!(ctx.wiki_editor_id(), None);
    }

    #[tokio::test]
    async fn test_malformed_user_id_rejected() {
        let request = Request::builder().header("x-user-id", "abc").body(()).unwrap();
        let (status, body) = extract(request).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_ARGUMENT");
        assert_eq!(body.error, "invalid argument: malformed x-user-id \"abc\"");
    }
}
