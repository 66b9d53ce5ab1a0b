//! Error types for the Tooldesk client

use thiserror::Error;

/// Failure categories surfaced to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failures, expired or revoked sessions
    Transport,
    /// Client-side checks that blocked a submission
    Validation,
    /// Server-side 4xx carrying a message payload
    BusinessRule,
    /// Image rejected or upload failed
    Upload,
    Internal,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build an error from a non-success HTTP status and the server's message
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("HTTP {}", status));
        match status {
            401 => AppError::Unauthorized(message),
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message),
            409 => AppError::Conflict(message),
            400..=499 => AppError::BusinessRule(message),
            _ => AppError::Server { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::SessionExpired
            | AppError::Network(_)
            | AppError::Server { .. } => ErrorKind::Transport,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) | AppError::BusinessRule(_) | AppError::Conflict(_) => {
                ErrorKind::BusinessRule
            }
            AppError::Upload(_) => ErrorKind::Upload,
            AppError::Decode(_) | AppError::Config(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Text shown to the operator in a transient notification.
    ///
    /// Server messages are passed through verbatim; transport failures get a
    /// generic text since their details are only useful in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::BusinessRule(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Upload(msg) => msg.clone(),
            AppError::Unauthorized(_) | AppError::SessionExpired => {
                "Phiên đăng nhập đã hết hạn, vui lòng đăng nhập lại".to_string()
            }
            AppError::Forbidden(_) => "Bạn không có quyền thực hiện thao tác này".to_string(),
            AppError::Network(_) | AppError::Server { .. } => {
                "Không thể kết nối tới máy chủ, vui lòng thử lại".to_string()
            }
            AppError::Decode(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Đã xảy ra lỗi, vui lòng thử lại".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Decode(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let message = fields
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect::<Vec<_>>()
            .join("; ");
        if message.is_empty() {
            AppError::Validation(errors.to_string())
        } else {
            AppError::Validation(message)
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(AppError::from_status(401, None), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from_status(403, None), AppError::Forbidden(_)));
        assert!(matches!(
            AppError::from_status(422, Some("Danh mục không hợp lệ".into())),
            AppError::BusinessRule(ref m) if m == "Danh mục không hợp lệ"
        ));
        assert!(matches!(AppError::from_status(502, None), AppError::Server { status: 502, .. }));
    }

    #[test]
    fn test_business_message_is_verbatim() {
        let err = AppError::from_status(400, Some("Thiết bị đích không tương thích".into()));
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
        assert_eq!(err.user_message(), "Thiết bị đích không tương thích");
    }

    #[test]
    fn test_network_message_is_generic() {
        let err = AppError::Network("connection refused".into());
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.user_message().contains("refused"));
    }
}
