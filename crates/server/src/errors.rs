use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::ModelError;
use serde::Serialize;
use service::ai::AiError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Error body: `{message, code?}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), code: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn unauthorized(message: impl Into<String>) -> Self { Self::new(StatusCode::UNAUTHORIZED, message) }

    pub fn forbidden(message: impl Into<String>) -> Self { Self::new(StatusCode::FORBIDDEN, message) }

    fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { message: &self.message, code: self.code };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => ApiError::bad_request(m),
            ServiceError::NotFound(m) => ApiError::new(StatusCode::NOT_FOUND, m),
            ServiceError::Conflict(m) => ApiError::new(StatusCode::CONFLICT, m),
            ServiceError::Forbidden(m) => ApiError::forbidden(m),
            ServiceError::InsufficientFunds => ApiError {
                status: StatusCode::BAD_REQUEST,
                message: "Insufficient balance".into(),
                code: Some("INSUFFICIENT_FUNDS"),
            },
            ServiceError::Model(ModelError::Validation(m)) => ApiError::bad_request(m),
            ServiceError::Model(ModelError::NotFound(m)) => ApiError::new(StatusCode::NOT_FOUND, m),
            ServiceError::Model(e @ ModelError::Db(_)) => ApiError::internal(e),
            ServiceError::Auth(a) => a.into(),
            e @ (ServiceError::Db(_) | ServiceError::Storage(_)) => ApiError::internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(m) => ApiError::bad_request(m),
            AuthError::Conflict => ApiError::new(StatusCode::CONFLICT, "User already exists"),
            AuthError::NotFound => ApiError::new(StatusCode::NOT_FOUND, "User not found"),
            AuthError::Unauthorized => ApiError::unauthorized("Invalid credentials"),
            AuthError::TokenError(m) => {
                warn!(error = %m, "token rejected");
                ApiError::forbidden("Invalid token")
            }
            e @ (AuthError::HashError(_) | AuthError::Repository(_)) => {
                let code = e.code();
                error!(code, error = %e, "auth failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        }
    }
}

/// AI route failures keep the `{error, details}` shape the chat clients expect.
#[derive(Debug, Error)]
pub enum AiRouteError {
    #[error("{0}")]
    Config(String),
    #[error("AI Service Unavailable")]
    Llm(String),
    #[error("ZeroClaw Service Unavailable")]
    Agent(String),
    #[error("{0}")]
    Invalid(String),
}

impl AiRouteError {
    pub fn llm(e: AiError) -> Self {
        match e {
            AiError::NotConfigured(_) => AiRouteError::Config(e.to_string()),
            AiError::Validation(m) => AiRouteError::Invalid(m),
            other => AiRouteError::Llm(other.to_string()),
        }
    }
}

impl IntoResponse for AiRouteError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AiRouteError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            AiRouteError::Invalid(_) => (StatusCode::BAD_REQUEST, None),
            AiRouteError::Llm(d) => (StatusCode::INTERNAL_SERVER_ERROR, Some(d.clone())),
            AiRouteError::Agent(d) => (StatusCode::SERVICE_UNAVAILABLE, Some(d.clone())),
        };
        warn!(status = status.as_u16(), error = %self, details = details.as_deref().unwrap_or(""), "ai route failed");
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Some(d) = details {
            body["details"] = serde_json::Value::String(d);
        }
        (status, Json(body)).into_response()
    }
}

/// `Json` whose rejections use the `{message}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::new(r.status(), r.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
