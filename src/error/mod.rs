use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

pub type Result<T> = std::result::Result<T, FlowMgtError>;

#[derive(Debug, thiserror::Error)]
pub enum FlowMgtError {
    #[error("Invalid request format: {0}")]
    InvalidRequestFormat(String),

    #[error("Flow handle is required")]
    MissingHandle,

    #[error("Invalid flow handle format: {0}")]
    InvalidHandleFormat(String),

    #[error("Flow name is required")]
    MissingName,

    #[error("Invalid flow type: {0}")]
    InvalidFlowType(String),

    #[error("Invalid flow data: {0}")]
    InvalidFlowData(String),

    #[error("A flow with handle '{0}' already exists")]
    DuplicateHandle(String),

    #[error("Invalid flow version: {0}")]
    InvalidVersion(String),

    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("Flow version not found: {0}")]
    FlowVersionNotFound(String),

    #[error("Flow type cannot be changed after creation")]
    CannotUpdateFlowType,

    #[error("Flow handle cannot be changed after creation")]
    HandleUpdateNotAllowed,

    #[error("Graph build failure: {0}")]
    GraphBuildFailure(String),

    #[error("Deployment is immutable: {0}")]
    DeploymentImmutable(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl FlowMgtError {
    /// Stable API error code surfaced to clients.
    pub fn code(&self) -> &'static str {
        match self {
            FlowMgtError::InvalidRequestFormat(_) => "FLM-1001",
            FlowMgtError::MissingHandle => "FLM-1002",
            FlowMgtError::InvalidHandleFormat(_) => "FLM-1003",
            FlowMgtError::MissingName => "FLM-1004",
            FlowMgtError::InvalidFlowType(_) => "FLM-1005",
            FlowMgtError::InvalidFlowData(_) => "FLM-1006",
            FlowMgtError::DuplicateHandle(_) => "FLM-1007",
            FlowMgtError::InvalidVersion(_) => "FLM-1008",
            FlowMgtError::FlowNotFound(_) => "FLM-1009",
            FlowMgtError::FlowVersionNotFound(_) => "FLM-1010",
            FlowMgtError::CannotUpdateFlowType => "FLM-1011",
            FlowMgtError::HandleUpdateNotAllowed => "FLM-1012",
            FlowMgtError::GraphBuildFailure(_) => "FLM-1013",
            FlowMgtError::DeploymentImmutable(_) => "FLM-1014",
            FlowMgtError::NotSupported(_) => "FLM-1015",
            FlowMgtError::DatabaseError(_)
            | FlowMgtError::RedisError(_)
            | FlowMgtError::SerializationError(_)
            | FlowMgtError::InternalError(_) => "FLM-1500",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.code() != "FLM-1500"
    }
}

impl From<String> for FlowMgtError {
    fn from(msg: String) -> Self {
        FlowMgtError::InternalError(msg)
    }
}

impl IntoResponse for FlowMgtError {
    fn into_response(self) -> Response {
        let status = match self {
            FlowMgtError::FlowNotFound(_) | FlowMgtError::FlowVersionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            FlowMgtError::DeploymentImmutable(_) => StatusCode::FORBIDDEN,
            FlowMgtError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
            _ if self.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        };

        let body = Json(json!({
            "code": self.code(),
            "message": message,
            "timestamp": Utc::now().to_rfc3339()
        }));

        (status, body).into_response()
    }
}
