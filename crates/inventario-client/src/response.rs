use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatcher::ApiResponse;
use crate::error::ClientError;

/// Decode a successful response, or turn an error status into
/// [`ClientError::Status`] with the backend's own message.
pub fn handle_response<T: DeserializeOwned>(response: ApiResponse) -> Result<T, ClientError> {
    if !response.is_success() {
        return Err(status_error(&response));
    }
    Ok(serde_json::from_slice(&response.body)?)
}

/// Like [`handle_response`] but accepts an empty body (e.g. `204 No Content`).
pub fn handle_optional<T: DeserializeOwned>(response: ApiResponse) -> Result<Option<T>, ClientError> {
    if !response.is_success() {
        return Err(status_error(&response));
    }
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&response.body)?))
}

pub fn status_error(response: &ApiResponse) -> ClientError {
    ClientError::Status {
        status: response.status.as_u16(),
        message: error_message(response),
    }
}

/// Message for a failed response.
///
/// FastAPI validation errors carry `detail` as a list of `{msg}` objects;
/// other errors carry `detail` or `message` as a string.
pub fn error_message(response: &ApiResponse) -> String {
    let fallback = || format!("Error HTTP: {} {}", response.status.as_u16(), response.reason());
    let Ok(body) = serde_json::from_slice::<Value>(&response.body) else {
        return fallback();
    };
    match body.get("detail") {
        Some(Value::Array(items)) => {
            return items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ");
        }
        Some(Value::String(detail)) => return detail.clone(),
        _ => {}
    }
    match body.get("message") {
        Some(Value::String(message)) => message.clone(),
        _ => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventario_types::Asset;
    use reqwest::StatusCode;

    fn resp(code: u16, body: &'static str) -> ApiResponse {
        ApiResponse::new(StatusCode::from_u16(code).unwrap(), body)
    }

    #[test]
    fn test_fastapi_validation_details_are_joined() {
        let r = resp(
            422,
            r#"{"detail":[{"loc":["body","x"],"msg":"field required"},{"msg":"value is not a valid integer"}]}"#,
        );
        assert_eq!(error_message(&r), "field required, value is not a valid integer");
    }

    #[test]
    fn test_detail_then_message_then_status_line() {
        assert_eq!(error_message(&resp(404, r#"{"detail":"Activo no encontrado"}"#)), "Activo no encontrado");
        assert_eq!(error_message(&resp(400, r#"{"message":"bad"}"#)), "bad");
        assert_eq!(error_message(&resp(503, "<html>")), "Error HTTP: 503 Service Unavailable");
        assert_eq!(error_message(&resp(500, "{}")), "Error HTTP: 500 Internal Server Error");
    }

    #[test]
    fn test_success_decodes_and_bad_body_is_decode_error() {
        let assets: Vec<Asset> = handle_response(resp(200, r#"[{"id":1},{"id":2}]"#)).unwrap();
        assert_eq!(assets.len(), 2);
        let err = handle_response::<Vec<Asset>>(resp(200, "not json")).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        let err = handle_response::<Vec<Asset>>(resp(404, r#"{"detail":"x"}"#)).unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
    }

    #[test]
    fn test_empty_body_is_none() {
        let none: Option<Asset> = handle_optional(resp(204, "")).unwrap();
        assert!(none.is_none());
        let some: Option<Asset> = handle_optional(resp(200, r#"{"id":3}"#)).unwrap();
        assert_eq!(some.map(|a| a.id), Some(3));
    }
}
