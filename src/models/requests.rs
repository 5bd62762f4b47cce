use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::AppError;

/// Body of both validation endpoints, as sent on the wire.
#[derive(Debug, Deserialize)]
struct ValidationRequestBody {
    #[serde(default)]
    payload: Option<Box<RawValue>>,
    #[serde(default)]
    args: Option<Vec<String>>,
}

/// A checked validation request: the payload is present and kept exactly as
/// the client sent it, the arguments are forwarded to the validator untouched.
#[derive(Debug)]
pub struct ValidationRequest {
    payload: Box<RawValue>,
    args: Vec<String>,
}

impl ValidationRequest {
    /// Parse a request body. A missing or `null` payload is rejected.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let body: ValidationRequestBody = serde_json::from_slice(body)?;

        let payload = body.payload.ok_or(AppError::PayloadRequired)?;

        Ok(Self {
            payload,
            args: body.args.unwrap_or_default(),
        })
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.get().as_bytes()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}
