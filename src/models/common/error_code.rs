use actix_web::http::StatusCode;

use crate::errors::PortalError;

// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 2000,
    AuthFailed = 2001,
    SessionExpired = 2002,
    Forbidden = 2003,
    NotFound = 3000,
    ProfileNotFound = 3001,
    RateLimitExceeded = 4029,
    InternalServerError = 5000,
    BackendUnavailable = 5001,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Success => StatusCode::OK,
            ErrorCode::BadRequest | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized | ErrorCode::AuthFailed | ErrorCode::SessionExpired => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound | ErrorCode::ProfileNotFound => StatusCode::NOT_FOUND,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::BackendUnavailable => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<&PortalError> for ErrorCode {
    fn from(err: &PortalError) -> Self {
        match err {
            PortalError::Validation(_) => ErrorCode::ValidationFailed,
            PortalError::Authentication(_) => ErrorCode::AuthFailed,
            PortalError::Authorization(_) => ErrorCode::Forbidden,
            PortalError::NotFound(_) => ErrorCode::NotFound,
            PortalError::RowNotFound(_) => ErrorCode::ProfileNotFound,
            PortalError::BackendRequest(_) | PortalError::BackendResponse(_) => {
                ErrorCode::BackendUnavailable
            }
            _ => ErrorCode::InternalServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ErrorCode::from(&PortalError::authentication("bad password")),
            ErrorCode::AuthFailed
        );
        assert_eq!(
            ErrorCode::from(&PortalError::backend_request("timeout")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ErrorCode::Forbidden as i32, 2003);
    }
}
