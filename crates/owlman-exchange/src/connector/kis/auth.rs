//! KIS OAuth 2.0 인증 모듈.
//!
//! 접근 토큰 발급(POST /oauth2/tokenP)과 만료 전 자동 갱신을 담당합니다.

use super::config::KisConfig;
use crate::ExchangeError;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// 토큰 갱신 임계값 (남은 시간이 이 값보다 적으면 갱신).
const TOKEN_REFRESH_THRESHOLD_HOURS: i64 = 1;

/// 사전 발급 토큰의 유효 기간 가정치 (KIS 토큰 수명 24시간).
const SUPPLIED_TOKEN_LIFETIME_HOURS: i64 = 24;

/// KIS OAuth 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 토큰 만료 시간 (초)
    pub expires_in: i64,
    /// 접근 토큰 만료 시각 (KIS 형식: "YYYY-MM-DD HH:MM:SS")
    #[serde(default)]
    pub access_token_token_expired: String,
}

/// KIS OAuth 오류 응답.
#[derive(Debug, Clone, Deserialize)]
struct KisOAuthErrorResponse {
    error_code: String,
    error_description: String,
}

/// 만료 추적이 포함된 토큰 상태.
#[derive(Debug, Clone)]
pub struct TokenState {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입
    pub token_type: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// 새 토큰 상태 생성.
    pub fn new(access_token: String, token_type: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type,
            expires_at,
        }
    }

    /// 토큰이 만료되었거나 곧 만료되는지 확인.
    pub fn is_expired_or_expiring(&self) -> bool {
        let threshold = Utc::now() + Duration::hours(TOKEN_REFRESH_THRESHOLD_HOURS);
        self.expires_at <= threshold
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// KIS OAuth 인증 관리자.
///
/// 여러 요청이 `Arc`로 공유하며, 토큰은 `RwLock` 안에서 갱신됩니다.
/// KIS는 토큰 발급을 1분에 1회로 제한하므로 프로세스 안에서 토큰을 재사용해야 합니다.
pub struct KisOAuth {
    config: KisConfig,
    client: Client,
    token: Arc<RwLock<Option<TokenState>>>,
}

impl KisOAuth {
    /// 새로운 OAuth 관리자 생성.
    ///
    /// 설정에 `access_token`이 있으면 발급 없이 그 토큰을 사용합니다.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: KisConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        let supplied = config.access_token.as_ref().map(|token| {
            debug!("Using pre-issued KIS access token");
            TokenState::new(
                token.clone(),
                "Bearer".to_string(),
                Utc::now() + Duration::hours(SUPPLIED_TOKEN_LIFETIME_HOURS),
            )
        });

        Ok(Self {
            config,
            client,
            token: Arc::new(RwLock::new(supplied)),
        })
    }

    /// 유효한 접근 토큰 반환, 필요시 갱신.
    pub async fn get_token(&self) -> Result<TokenState, ExchangeError> {
        {
            let token_guard = self.token.read().await;
            match token_guard.as_ref() {
                Some(token) if !token.is_expired_or_expiring() => return Ok(token.clone()),
                Some(token) => warn!(
                    expires_at = %token.expires_at,
                    "KIS token expired or expiring soon, refreshing"
                ),
                None => info!("No cached KIS token found, requesting new token"),
            }
        }

        // 쓰기 락 안에서 다시 확인: 동시에 만료를 본 요청은 한 번만 발급
        let mut token_guard = self.token.write().await;
        if let Some(token) = token_guard.as_ref().filter(|t| !t.is_expired_or_expiring()) {
            return Ok(token.clone());
        }

        let token_state = self.issue_token().await?;
        *token_guard = Some(token_state.clone());
        Ok(token_state)
    }

    /// 접근 토큰 강제 갱신.
    pub async fn refresh_token(&self) -> Result<TokenState, ExchangeError> {
        let mut token_guard = self.token.write().await;
        let token_state = self.issue_token().await?;
        *token_guard = Some(token_state.clone());
        Ok(token_state)
    }

    /// `POST /oauth2/tokenP`로 새 토큰을 발급받습니다 (캐시는 호출자가 갱신).
    async fn issue_token(&self) -> Result<TokenState, ExchangeError> {
        if self.config.app_key.is_empty() || self.config.app_secret.is_empty() {
            return Err(ExchangeError::Unauthorized(
                "KIS AppKey/AppSecret 환경변수가 설정되지 않았습니다.".to_string(),
            ));
        }

        let url = format!("{}/oauth2/tokenP", self.config.rest_base_url());

        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            appkey: &'a str,
            appsecret: &'a str,
        }

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .json(&TokenRequest {
                grant_type: "client_credentials",
                appkey: &self.config.app_key,
                appsecret: &self.config.app_secret,
            })
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!(%status, "Token request failed: {}", body);

            if let Ok(oauth_error) = serde_json::from_str::<KisOAuthErrorResponse>(&body) {
                let message = match oauth_error.error_code.as_str() {
                    "EGW00103" => "유효하지 않은 AppKey입니다.".to_string(),
                    "EGW00102" => "AppKey가 만료되었습니다.".to_string(),
                    "EGW00101" => "AppSecret이 일치하지 않습니다.".to_string(),
                    _ => format!(
                        "{} ({})",
                        oauth_error.error_description, oauth_error.error_code
                    ),
                };
                return Err(ExchangeError::Unauthorized(message));
            }

            return Err(ExchangeError::http(status, body));
        }

        let token_resp: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        let expires_at = parse_kis_datetime(&token_resp.access_token_token_expired)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(token_resp.expires_in));

        let token_state = TokenState::new(
            token_resp.access_token,
            token_resp.token_type,
            expires_at,
        );

        info!(expires_at = %token_state.expires_at, "KIS access token obtained");

        Ok(token_state)
    }

    /// 인증된 요청을 위한 공통 헤더 생성.
    ///
    /// `tr_cont`는 연속 조회 시 `"N"`을 넘깁니다.
    pub async fn build_headers(
        &self,
        tr_id: &str,
        tr_cont: Option<&str>,
    ) -> Result<HeaderMap, ExchangeError> {
        let token = self.get_token().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert("authorization", header_value("authorization", &token.auth_header())?);
        headers.insert("appkey", header_value("appkey", &self.config.app_key)?);
        headers.insert("appsecret", header_value("appsecret", &self.config.app_secret)?);
        headers.insert("tr_id", header_value("tr_id", tr_id)?);

        if let Some(cont) = tr_cont {
            headers.insert("tr_cont", header_value("tr_cont", cont)?);
        }

        if self.config.personalized {
            headers.insert("custtype", HeaderValue::from_static("P"));
        }

        Ok(headers)
    }

    /// 설정 반환.
    pub fn config(&self) -> &KisConfig {
        &self.config
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ExchangeError> {
    HeaderValue::from_str(value)
        .map_err(|_| ExchangeError::ParseError(format!("{}에 유효하지 않은 문자 포함", name)))
}

/// KIS 날짜시간 형식 파싱 ("YYYY-MM-DD HH:MM:SS", KST).
fn parse_kis_datetime(s: &str) -> Option<DateTime<Utc>> {
    use chrono::{NaiveDateTime, TimeZone};
    use chrono_tz::Asia::Seoul;

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    let kst = Seoul.from_local_datetime(&naive).single()?;
    Some(kst.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::kis::KisAccountType;
    use chrono::Timelike;

    fn config() -> KisConfig {
        KisConfig::new("app-key", "app-secret", "12345678-01", KisAccountType::RealGeneral)
    }

    #[test]
    fn test_token_state_expiring() {
        let token = TokenState::new(
            "test".to_string(),
            "Bearer".to_string(),
            Utc::now() + Duration::minutes(30),
        );
        assert!(token.is_expired_or_expiring());

        let token = TokenState::new(
            "abc123".to_string(),
            "Bearer".to_string(),
            Utc::now() + Duration::hours(24),
        );
        assert!(!token.is_expired_or_expiring());
        assert_eq!(token.auth_header(), "Bearer abc123");
    }

    #[test]
    fn test_parse_kis_datetime() {
        let dt = parse_kis_datetime("2026-01-28 15:30:00").unwrap();
        // KST 15:30 = UTC 06:30
        assert_eq!(dt.hour(), 6);
        assert_eq!(dt.minute(), 30);
        assert!(parse_kis_datetime("20260128").is_none());
    }

    #[tokio::test]
    async fn test_supplied_token_skips_issue() {
        let oauth = KisOAuth::new(config().with_access_token("pre-issued")).unwrap();
        let token = oauth.get_token().await.unwrap();
        assert_eq!(token.access_token, "pre-issued");

        let headers = oauth.build_headers("CTCA0903R", Some("N")).await.unwrap();
        assert_eq!(headers["authorization"], "Bearer pre-issued");
        assert_eq!(headers["tr_id"], "CTCA0903R");
        assert_eq!(headers["tr_cont"], "N");
        assert_eq!(headers["custtype"], "P");
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let oauth = KisOAuth::new(KisConfig::new("", "", "1", KisAccountType::Paper)).unwrap();
        let err = oauth.refresh_token().await.unwrap_err();
        assert!(err.is_auth_error());
    }
}
