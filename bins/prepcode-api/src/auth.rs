// Authenticated user context
// The auth gateway in front of this service verifies the session and forwards
// the user id in a header; this service only reads it.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser(id.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<AuthUser, ApiError> {
        let (mut parts, _) = req.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_user_header_present() {
        let req = Request::builder()
            .header(USER_ID_HEADER, " user-42 ")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap(), AuthUser("user-42".to_string()));
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_rejected() {
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));

        let req = Request::builder()
            .header(USER_ID_HEADER, "   ")
            .body(())
            .unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::Unauthorized)));
    }
}
