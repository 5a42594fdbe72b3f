use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Envelope shared by every finance endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: String, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError { code, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 3}));

        let err = serde_json::to_value(ApiResponse::error(
            "NOT_FOUND".into(),
            "Fee not found".into(),
        ))
        .unwrap();
        assert_eq!(
            err,
            serde_json::json!({
                "success": false,
                "error": {"code": "NOT_FOUND", "message": "Fee not found"}
            })
        );
    }
}
