//! 한국투자증권 (KIS) API 설정.
//!
//! 다중 계좌 지원:
//! - 모의투자
//! - 실전투자 일반
//! - 실전투자 ISA

use serde::{Deserialize, Serialize};

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KisEnvironment {
    /// 실전투자
    #[default]
    Real,
    /// 모의투자
    Paper,
}

impl KisEnvironment {
    /// 이 환경의 REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }
}

/// KIS 계좌 유형.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KisAccountType {
    /// 모의투자
    Paper,
    /// 실전투자 일반
    #[default]
    RealGeneral,
    /// 실전투자 ISA
    RealIsa,
}

impl KisAccountType {
    /// 이 계좌 유형의 환경 반환.
    pub fn environment(&self) -> KisEnvironment {
        match self {
            KisAccountType::Paper => KisEnvironment::Paper,
            KisAccountType::RealGeneral | KisAccountType::RealIsa => KisEnvironment::Real,
        }
    }

    /// 표시 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            KisAccountType::Paper => "모의투자",
            KisAccountType::RealGeneral => "실전투자(일반)",
            KisAccountType::RealIsa => "실전투자(ISA)",
        }
    }

    /// 환경 변수 접두사.
    fn env_prefix(&self) -> &'static str {
        match self {
            KisAccountType::Paper => "KIS_PAPER",
            KisAccountType::RealGeneral => "KIS_REAL_GENERAL",
            KisAccountType::RealIsa => "KIS_REAL_ISA",
        }
    }

    /// 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "paper" | "mock" => Some(KisAccountType::Paper),
            "real_general" | "general" | "real" => Some(KisAccountType::RealGeneral),
            "real_isa" | "isa" => Some(KisAccountType::RealIsa),
            _ => None,
        }
    }
}

/// KIS API 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KisConfig {
    /// 앱키
    pub app_key: String,
    /// 앱시크릿
    pub app_secret: String,
    /// 계좌번호 - 형식: "XXXXXXXX-XX" 또는 앞 8자리
    pub account_no: String,
    /// 계좌상품코드 - 주식의 경우 일반적으로 "01"
    pub account_product_code: String,
    /// 계좌 유형
    pub account_type: KisAccountType,
    /// 환경 (실전/모의) - account_type에서 파생
    pub environment: KisEnvironment,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 개인 고객 구분 헤더(custtype=P) 전송 여부
    pub personalized: bool,
    /// 미리 발급받은 접근 토큰 (있으면 토큰 발급 생략)
    #[serde(default)]
    pub access_token: Option<String>,
    /// REST 기본 URL 대체값 (테스트용 목 서버 등)
    #[serde(default)]
    pub base_url_override: Option<String>,
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        account_no: impl Into<String>,
        account_type: KisAccountType,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            account_no: account_no.into(),
            account_product_code: "01".to_string(),
            account_type,
            environment: account_type.environment(),
            timeout_secs: 30,
            personalized: true,
            access_token: None,
            base_url_override: None,
        }
    }

    /// 계좌상품코드 설정.
    pub fn with_product_code(mut self, code: impl Into<String>) -> Self {
        self.account_product_code = code.into();
        self
    }

    /// 미리 발급받은 접근 토큰 설정.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// REST 기본 URL을 덮어씁니다.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 환경 변수에서 특정 계좌 유형의 설정 생성.
    ///
    /// # 환경 변수
    /// - `{PREFIX}_APP_KEY`, `{PREFIX}_APP_SECRET`, `{PREFIX}_ACCOUNT_NUMBER`,
    ///   `{PREFIX}_ACCOUNT_CODE` (PREFIX: KIS_PAPER, KIS_REAL_GENERAL, KIS_REAL_ISA)
    /// - 공통: `KIS_ACCESS_TOKEN`
    pub fn from_env_for_account(account_type: KisAccountType) -> Option<Self> {
        let prefix = account_type.env_prefix();

        let app_key = std::env::var(format!("{}_APP_KEY", prefix)).ok()?;
        let app_secret = std::env::var(format!("{}_APP_SECRET", prefix)).ok()?;
        let account_no = std::env::var(format!("{}_ACCOUNT_NUMBER", prefix)).ok()?;
        let product_code = std::env::var(format!("{}_ACCOUNT_CODE", prefix))
            .unwrap_or_else(|_| "01".to_string());

        let mut config = Self::new(app_key, app_secret, account_no, account_type)
            .with_product_code(product_code);
        config.access_token = std::env::var("KIS_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Some(config)
    }

    /// `KIS_DEFAULT_ACCOUNT` 환경 변수(기본값: real_general)로 계좌를 골라 설정 생성.
    pub fn from_env() -> Option<Self> {
        let account_type = std::env::var("KIS_DEFAULT_ACCOUNT")
            .ok()
            .and_then(|s| KisAccountType::parse(&s))
            .unwrap_or_default();

        Self::from_env_for_account(account_type)
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_base_url())
    }

    /// 계좌번호 앞 8자리 반환 (CANO).
    pub fn cano(&self) -> String {
        self.account_no.replace('-', "").chars().take(8).collect()
    }

    /// 계좌상품코드 반환 (ACNT_PRDT_CD).
    pub fn acnt_prdt_cd(&self) -> &str {
        &self.account_product_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = KisConfig::new("key", "secret", "12345678-01", KisAccountType::Paper);

        assert_eq!(config.environment, KisEnvironment::Paper);
        assert_eq!(config.account_product_code, "01");
        assert!(config.access_token.is_none());
        assert_eq!(
            config.rest_base_url(),
            "https://openapivts.koreainvestment.com:29443"
        );
    }

    #[test]
    fn test_account_parsing() {
        let config = KisConfig::new("key", "secret", "12345678-01", KisAccountType::RealIsa);
        assert_eq!(config.cano(), "12345678");
        assert_eq!(config.acnt_prdt_cd(), "01");
        assert_eq!(config.environment, KisEnvironment::Real);

        let bare = KisConfig::new("key", "secret", "87654321", KisAccountType::RealGeneral);
        assert_eq!(bare.cano(), "87654321");
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(KisAccountType::parse("ISA"), Some(KisAccountType::RealIsa));
        assert_eq!(KisAccountType::parse("paper"), Some(KisAccountType::Paper));
        assert_eq!(KisAccountType::parse("unknown"), None);
        assert_eq!(KisAccountType::RealGeneral.display_name(), "실전투자(일반)");
    }

    #[test]
    fn test_base_url_override() {
        let config = KisConfig::new("k", "s", "12345678-01", KisAccountType::RealGeneral)
            .with_base_url("http://127.0.0.1:1234");
        assert_eq!(config.rest_base_url(), "http://127.0.0.1:1234");
    }
}
