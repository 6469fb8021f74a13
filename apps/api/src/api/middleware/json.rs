use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;

/// JSON request body whose rejections render as `ApiError` (400)
///
/// Usage:
/// ```rust,ignore
/// async fn handler(ApiJson(req): ApiJson<RemarkRequest>) -> Result<StatusCode, ApiError> {
///     Ok(StatusCode::CREATED)
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Titled {
        title: String,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let request = json_request(r#"{"title":"Leak"}"#);
        let ApiJson(titled) = ApiJson::<Titled>::from_request(request, &()).await.unwrap();
        assert_eq!(titled.title, "Leak");
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let err = ApiJson::<Titled>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("title"), "{}", err.message);
    }

    #[tokio::test]
    async fn syntax_error_and_missing_content_type_are_bad_requests() {
        let err = ApiJson::<Titled>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let plain = Request::builder()
            .method("POST")
            .body(Body::from(r#"{"title":"Leak"}"#))
            .unwrap();
        let err = ApiJson::<Titled>::from_request(plain, &()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
