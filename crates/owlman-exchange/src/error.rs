//! 증권사/데이터 제공자 에러 타입.

use owlman_core::OwlError;
use thiserror::Error;

/// 외부 API 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드 (HTTP 상태 코드 또는 KIS msg_cd)
    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 데이터 없음
    #[error("Not found: {0}")]
    NotFound(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ExchangeError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::NetworkError(_) | ExchangeError::RateLimited | ExchangeError::Timeout(_)
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }

    /// HTTP 상태 코드로 API 에러를 만듭니다.
    pub(crate) fn http(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ExchangeError::Unauthorized(body),
            429 => ExchangeError::RateLimited,
            code => ExchangeError::ApiError {
                code: code.to_string(),
                message: body,
            },
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for OwlError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::NetworkError(msg) | ExchangeError::Timeout(msg) => {
                OwlError::Network(msg)
            }
            ExchangeError::Unauthorized(msg) => OwlError::Auth(msg),
            ExchangeError::NotFound(msg) => OwlError::NotFound(msg),
            ExchangeError::ParseError(msg) => OwlError::Data(msg),
            other => OwlError::Exchange(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        let err = ExchangeError::http(reqwest::StatusCode::UNAUTHORIZED, "bad token".into());
        assert!(err.is_auth_error());

        let err = ExchangeError::http(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(err.is_retryable());

        match ExchangeError::http(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops".into()) {
            ExchangeError::ApiError { code, message } => {
                assert_eq!(code, "500");
                assert_eq!(message, "oops");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_into_core_error() {
        let core: OwlError = ExchangeError::Timeout("5s".into()).into();
        assert!(core.is_retryable());

        let core: OwlError = ExchangeError::ApiError {
            code: "EGW00201".into(),
            message: "초당 거래건수 초과".into(),
        }
        .into();
        assert!(matches!(core, OwlError::Exchange(_)));
    }
}
