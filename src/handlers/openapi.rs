use axum::{response::IntoResponse, Json};
use serde_json::{json, Value};

fn request_body() -> Value {
    json!({
        "required": true,
        "description": "FHIR payload and validator arguments",
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ValidationRequest" }
            }
        }
    })
}

fn plain_text(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "text/plain": { "schema": { "type": "string" } } }
    })
}

/// OpenAPI description of the validation endpoints.
pub async fn openapi() -> impl IntoResponse {
    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "FHIR Validator API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "HTTP API for the FHIR validator_cli"
        },
        "servers": [{ "url": "/api" }],
        "paths": {
            "/validate": {
                "post": {
                    "tags": ["validation"],
                    "summary": "Validate FHIR payload synchronously",
                    "description": "Runs validator_cli.jar on the payload and returns its console output as plain text",
                    "requestBody": request_body(),
                    "responses": {
                        "200": plain_text("Validation output"),
                        "400": plain_text("Bad request"),
                        "500": plain_text("Internal server error")
                    }
                }
            },
            "/validate/sse": {
                "post": {
                    "tags": ["validation"],
                    "summary": "Validate FHIR payload with SSE",
                    "description": "Runs validator_cli.jar on the payload and streams each console line as a `console_out` event; a failed run ends with one `server_error` event",
                    "requestBody": request_body(),
                    "responses": {
                        "200": {
                            "description": "Validation output stream",
                            "content": { "text/event-stream": { "schema": { "type": "string" } } }
                        },
                        "400": plain_text("Bad request"),
                        "500": plain_text("Internal server error")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ValidationRequest": {
                    "type": "object",
                    "required": ["payload"],
                    "properties": {
                        "payload": {
                            "type": "object",
                            "description": "FHIR resource to validate"
                        },
                        "args": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Extra validator_cli arguments, appended after the payload file"
                        }
                    }
                }
            }
        }
    }))
}
