//! 错误类型
//!
//! - `UpstreamError`：上游数据源调用失败（状态码 / 网络 / 数据格式）
//! - `ProxyError`：HTTP 层错误，统一输出 `{"error": "..."}`

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

/// 上游数据源错误
#[derive(Debug, Clone)]
pub enum UpstreamError {
    /// 上游返回非 2xx，保留原始状态码和响应体
    Status { status: u16, body: String },
    /// 网络错误或超时
    Transport(String),
    /// 响应无法解析或没有可用数据
    Payload(String),
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "upstream returned {status}"),
            Self::Transport(msg) => write!(f, "{msg}"),
            Self::Payload(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Payload(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

/// 代理接口错误
#[derive(Debug)]
pub enum ProxyError {
    BadRequest(String),
    Unauthorized(String),
    MethodNotAllowed,
    /// 透传上游状态码和响应体
    Upstream { status: u16, body: String },
    Internal(String),
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "{msg}"),
            Self::Unauthorized(msg) => write!(f, "{msg}"),
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::Upstream { status, .. } => write!(f, "upstream returned {status}"),
            Self::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ProxyError {}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Upstream { body, .. } => HttpResponse::build(self.status_code())
                .content_type("application/json")
                .body(body.clone()),
            _ => HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() })),
        }
    }
}

impl From<UpstreamError> for ProxyError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status, body } => Self::Upstream { status, body },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ProxyError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_relayed() {
        let err: ProxyError = UpstreamError::Status {
            status: 429,
            body: r#"{"message":"rate limited"}"#.to_string(),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_transport_failure_maps_to_500() {
        let err: ProxyError = UpstreamError::Transport("connection reset".to_string()).into();

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "connection reset");
    }
}
