use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Standard response envelope: `{code, message, data}`. `code` is 200 on
/// success and mirrors the HTTP status on errors (see `ApiError`).
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: "Success".to_string(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "code": 500,
                        "message": "Failed to serialize response data",
                        "data": Value::Null,
                    })),
                )
                    .into_response();
            }
        };

        Json(json!({
            "code": 200,
            "message": self.message,
            "data": data,
        }))
        .into_response()
    }
}

/// Paginated list payload used by every list endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub list: Vec<T>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
}

impl<T: Serialize> Page<T> {
    pub fn new(list: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        Self {
            list,
            total,
            page,
            page_size,
        }
    }
}

/// Handler result alias: success envelope or `ApiError`.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_serializes_camel_case_page_size() {
        let page = Page::new(vec![1, 2, 3], 42, 2, 10);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 42);
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["list"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn envelope_wraps_data_with_code_200() {
        let response = ApiResponse::success(json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 200);
        assert_eq!(body["message"], "Success");
        assert_eq!(body["data"]["id"], 1);
    }

    #[tokio::test]
    async fn null_data_is_preserved() {
        let response = ApiResponse::with_message((), "Logged out").into_response();
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Logged out");
        assert!(body["data"].is_null());
    }
}
