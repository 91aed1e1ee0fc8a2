use std::collections::HashMap;

use axum::{Json, http::StatusCode, response::IntoResponse};
use diesel_async::pooled_connection::deadpool::PoolError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub enum ServerError {
    DatabaseError(diesel::result::Error),
    PoolError(PoolError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::DatabaseError(e) => write!(f, "{e}"),
            ServerError::PoolError(e) => write!(f, "{e}"),
        }
    }
}

impl Serialize for ServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        use serde::ser::SerializeMap;
        let kind = match self {
            ServerError::DatabaseError(_) => "database",
            ServerError::PoolError(_) => "pool",
        };
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("kind", kind)?;
        map.serialize_entry("message", &self.to_string())?;
        map.end()
    }
}

/// Failures of the domain services, before they are mapped to HTTP.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub enum AppError {
    ServerError {
        error: ServerError,

        #[cfg(debug_assertions)]
        backtrace: Option<backtrace::Backtrace>,
    },
    Status {
        message: String,
        status: StatusCode,
    },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Status { status, .. } => *status,
        }
    }

    fn server(error: ServerError) -> Self {
        AppError::ServerError {
            error,

            #[cfg(debug_assertions)]
            backtrace: Some(backtrace::Backtrace::new()),
        }
    }
}

// Same shape as a successful envelope, with `success: false`
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,

    #[cfg(debug_assertions)]
    #[serde(skip_serializing_if = "Option::is_none")]
    debug_info: Option<HashMap<&'static str, Value>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status();
        let error_response = match self {
            AppError::ServerError {
                error,
                #[cfg(debug_assertions)]
                backtrace,
            } => {
                tracing::error!(%error, "Request failed with a server error");

                #[cfg(debug_assertions)]
                {
                    let frames_info = backtrace
                        .as_ref()
                        .map(filter_backtrace)
                        .unwrap_or_default();
                    ErrorResponse {
                        success: false,
                        message: "Database error".into(),
                        error: Some(error.to_string()),
                        debug_info: Some(HashMap::from([
                            (
                                "backtrace",
                                serde_json::to_value(&frames_info).unwrap_or_default(),
                            ),
                            ("error", serde_json::to_value(&error).unwrap_or_default()),
                        ])),
                    }
                }
                #[cfg(not(debug_assertions))]
                {
                    let _ = error;
                    ErrorResponse {
                        success: false,
                        message: "Internal server error".into(),
                        error: None,
                    }
                }
            }
            AppError::Status { message, .. } => ErrorResponse {
                success: false,
                message,
                error: None,
                #[cfg(debug_assertions)]
                debug_info: None,
            },
        };

        (status_code, Json(error_response)).into_response()
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::server(ServerError::DatabaseError(e))
    }
}

impl From<PoolError> for AppError {
    fn from(e: PoolError) -> Self {
        AppError::server(ServerError::PoolError(e))
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(what) => {
                (format!("{what} not found"), StatusCode::NOT_FOUND).into()
            }
            ServiceError::Conflict(message) => (message, StatusCode::CONFLICT).into(),
            ServiceError::Database(e) => e.into(),
        }
    }
}

impl From<(&'static str, StatusCode)> for AppError {
    fn from((message, status): (&'static str, StatusCode)) -> Self {
        AppError::Status {
            message: message.into(),
            status,
        }
    }
}

impl From<(String, StatusCode)> for AppError {
    fn from((message, status): (String, StatusCode)) -> Self {
        AppError::Status { message, status }
    }
}

#[derive(Serialize, Debug)]
struct FrameInfo {
    name: String,
    loc: String,
}

fn filter_backtrace(backtrace: &backtrace::Backtrace) -> Vec<FrameInfo> {
    const MODULE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");
    let mut frames_info: Vec<FrameInfo> = Vec::new();

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            if let (Some(name), Some(filename), Some(lineno)) = (
                symbol.name().map(|n| n.to_string()),
                symbol.filename().map(|f| f.to_owned()),
                symbol.lineno(),
            ) {
                if name.contains(MODULE_PREFIX) {
                    frames_info.push(FrameInfo {
                        name,
                        loc: format!("{}:{}", filename.display(), lineno),
                    });
                }
            }
        }
    }

    frames_info
}

#[cfg(test)]
mod test {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_error_renders_envelope() {
        let (status, body) =
            body_json(("Title is required", StatusCode::BAD_REQUEST).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], Value::Bool(false));
        assert_eq!(body["message"], "Title is required");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = body_json(ServiceError::NotFound("Blog").into()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Blog not found");
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let error: AppError =
            ServiceError::Conflict("Category with this name already exists").into();
        assert_eq!(error.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_database_error_maps_to_500() {
        let (status, body) =
            body_json(ServiceError::Database(diesel::result::Error::NotFound).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], Value::Bool(false));
    }
}
