use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use service_core::error::AppError;
use validator::Validate;

/// Deserializes and validates a JSON body.
///
/// An empty body is read as `{}` so that missing required fields surface as
/// field errors rather than a parse failure. Handlers that must authorize
/// before looking at the payload take the raw `Bytes` and call this.
pub fn parse_validated<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };

    let value: T = serde_json::from_slice(raw)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))?;

    value.validate()?;
    Ok(value)
}

/// Extractor form of [`parse_validated`].
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read body: {}", e)))?;

        parse_validated(&body).map(ValidatedJson)
    }
}

/// `deserialize_with` helper for text fields that strip surrounding
/// whitespace, so `"   "` fails a `length(min = 1)` check as blank.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

/// Reads a primary key given as a JSON number or a numeric string.
///
/// Type mismatches are reported against `field`.
pub fn parse_pk(field: &str, value: &serde_json::Value) -> Result<i64, AppError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        let received = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "str",
            serde_json::Value::Array(_) => "list",
            serde_json::Value::Object(_) => "dict",
        };
        AppError::field(
            field,
            format!("Incorrect type. Expected pk value, received {}.", received),
        )
    })
}

/// Error for a well-formed key that points at nothing.
pub fn missing_pk(field: &str, pk: i64) -> AppError {
    AppError::field(
        field,
        format!("Invalid pk \"{}\" - object does not exist.", pk),
    )
}
