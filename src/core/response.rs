// src/core/response.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    success: bool,
    error: String,
    #[serde(rename = "inUse", skip_serializing_if = "Option::is_none")]
    in_use: Option<bool>,
}

// 200, with `success: true` merged into the payload's fields.
pub fn success(data: Value) -> Response {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    match data {
        Value::Object(fields) => body.extend(fields),
        Value::Null => {}
        other => {
            body.insert("data".to_string(), other);
        }
    }
    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

// 200 { success, message }
pub fn message(message: impl Into<String>) -> Response {
    success(json!({ "message": message.into() }))
}

// 4xx, 5xx
pub fn failure(status: StatusCode, error: impl Into<String>, in_use: bool) -> Response {
    let body = ErrorBody {
        success: false,
        error: error.into(),
        in_use: in_use.then_some(true),
    };
    (status, Json(body)).into_response()
}

pub fn error(status: StatusCode, error: impl Into<String>) -> Response {
    failure(status, error, false)
}

// 404 Not Found
pub fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Resource not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_merges_payload_fields() {
        let response = success(json!({ "total": 2, "containers": [] }));
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "success": true, "total": 2, "containers": [] }));
    }

    #[tokio::test]
    async fn failure_only_carries_in_use_when_set() {
        let plain = body_json(error(StatusCode::BAD_REQUEST, "nope")).await;
        assert_eq!(plain, json!({ "success": false, "error": "nope" }));

        let response = failure(StatusCode::CONFLICT, "volume is in use", true);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["inUse"], json!(true));
        assert_eq!(body["success"], json!(false));
    }
}
