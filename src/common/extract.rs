// Request extractors whose rejections use the API's error body

use async_trait::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::error::ApiError;

/// JSON body extractor that reports malformed or missing bodies in the
/// same `{"success": false, "msg": "..."}` shape as every other failure
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "Rejected malformed JSON request body");
            ApiError::ValidationError(e.body_text())
        })?;
        Ok(ApiJson(value))
    }
}

/// Query-string extractor with the same uniform rejection body
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!(error = %e, "Rejected malformed query string");
                ApiError::ValidationError(e.body_text())
            })?;
        Ok(ApiQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    #[derive(serde::Deserialize)]
    struct CodeParams {
        #[allow(dead_code)]
        code: String,
    }

    #[tokio::test]
    async fn test_malformed_json_body_maps_to_validation_error() {
        let req = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from("{not valid json"))
            .expect("request");

        let result = ApiJson::<serde_json::Value>::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_missing_content_type_maps_to_validation_error() {
        let req = HttpRequest::builder()
            .method("POST")
            .body(Body::from(r#"{"query": "chart"}"#))
            .expect("request");

        let result = ApiJson::<serde_json::Value>::from_request(req, &()).await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_missing_query_param_maps_to_validation_error() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/api/sessions/oauth/github")
            .body(())
            .expect("request")
            .into_parts();

        let result = ApiQuery::<CodeParams>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_present_query_param_extracts() {
        let (mut parts, _) = HttpRequest::builder()
            .uri("/api/sessions/oauth/github?code=abc123")
            .body(())
            .expect("request")
            .into_parts();

        let result = ApiQuery::<CodeParams>::from_request_parts(&mut parts, &()).await;
        assert!(result.is_ok());
    }
}
