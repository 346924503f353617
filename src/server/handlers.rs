//! HTTP handlers for the gateway

use std::any::Any;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use super::AppState;
use crate::query::{QueryError, StatusQuery};

const TEXT_PLAIN: &str = "text/plain";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Query parameters accepted by `/apcaccess`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusParams {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl StatusParams {
    /// Collect `host` and `port` from raw query pairs.
    ///
    /// The first occurrence of a repeated parameter wins; unknown keys are
    /// ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "host" => &mut params.host,
                "port" => &mut params.port,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            } else {
                debug!("Ignoring repeated query parameter {}={}", key, value);
            }
        }
        params
    }
}

/// Run apcaccess and return its output unchanged
pub async fn apcaccess(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, QueryError> {
    let params = StatusParams::from_pairs(pairs);
    let query = StatusQuery::from_params(params.host.as_deref(), params.port.as_deref());
    if let Some(target) = query.target() {
        debug!("Querying remote NIS server {}", target);
    }
    let output = state.runner.run(&query).await?;

    debug!(
        "Serving {} bytes of apcaccess output ({}ms)",
        output.stdout.len(),
        output.elapsed.as_millis()
    );
    Ok(plain_text(StatusCode::OK, output.stdout))
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
        "OK",
    )
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> Response {
    warn!("No endpoint for {}", uri.path());
    plain_text(StatusCode::NOT_FOUND, "Endpoint not found".to_string())
}

/// Convert a handler panic into a 500 response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Unexpected error handling request: {}", detail);
    plain_text(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal error: {detail}"),
    )
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            QueryError::Failed { stderr, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("apcaccess failed: {stderr}"),
            ),
            QueryError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "apcaccess command timed out".to_string(),
            ),
            QueryError::CommandNotFound(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "apcaccess command not found".to_string(),
            ),
            QueryError::Io(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {e}"),
            ),
        };

        plain_text(status, body)
    }
}

/// UTF-8 text response with an explicit Content-Length
fn plain_text(status: StatusCode, body: String) -> Response {
    let length = HeaderValue::from(body.len());
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF8)),
            (header::CONTENT_LENGTH, length),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::time::Duration;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_failed_maps_to_500_with_stderr() {
        let response = QueryError::Failed {
            code: Some(1),
            stderr: "Error contacting host localhost port 3551: Connection refused".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Connection refused"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_504() {
        let response = QueryError::Timeout(Duration::from_secs(10)).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_text(response).await, "apcaccess command timed out");
    }

    #[tokio::test]
    async fn test_not_found_command_maps_to_500() {
        let response = QueryError::CommandNotFound("apcaccess".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "apcaccess command not found");
    }

    #[tokio::test]
    async fn test_io_error_maps_to_internal_error() {
        let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let response = QueryError::Io(err).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal error: pipe closed");
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_params_first_occurrence_wins() {
        let params = StatusParams::from_pairs(pairs(&[
            ("host", "10.0.0.5"),
            ("port", "3552"),
            ("host", "10.0.0.6"),
            ("port", "3553"),
            ("refresh", "1"),
        ]));

        assert_eq!(params.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(params.port.as_deref(), Some("3552"));
    }

    #[test]
    fn test_params_empty() {
        assert_eq!(StatusParams::from_pairs(Vec::new()), StatusParams::default());
    }

    #[tokio::test]
    async fn test_handle_panic() {
        let response = handle_panic(Box::new("status parser exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "Internal error: status parser exploded"
        );
    }
}
