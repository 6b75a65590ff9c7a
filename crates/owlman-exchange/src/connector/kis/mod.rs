//! 한국투자증권 (KIS) 국내 주식 연동 모듈.
//!
//! # 기능
//!
//! - OAuth 2.0 인증 및 자동 토큰 갱신 (사전 발급 토큰 재사용 가능)
//! - 투자계좌 자산현황, 주식잔고 조회
//! - 일별 시세, 휴장일 조회
//! - 일별 주문체결 조회 (연속 조회)
//!
//! 공식 API 문서: <https://apiportal.koreainvestment.com/>
//!
//! ```rust,ignore
//! use owlman_exchange::connector::kis::{KisConfig, KisKrClient, KisOAuth};
//!
//! let config = KisConfig::from_env().expect("KIS 환경 변수 없음");
//! let client = KisKrClient::new(KisOAuth::new(config)?)?;
//! let history = client.get_daily_price("069500").await?;
//! ```

pub mod auth;
pub mod client_kr;
pub mod config;

pub use auth::{KisOAuth, TokenState};
pub use client_kr::{
    AssetBalanceRow, DailyOrderPage, DailyOrderQuery, KisKrClient, KrHolding, KrOrderExecution,
    ASSET_CLASSES,
};
pub use config::{KisAccountType, KisConfig, KisEnvironment};

/// KIS 거래 ID (tr_id) 상수 모음.
pub mod tr_id {
    /// 투자계좌 자산현황 조회 (실전 전용)
    pub const KR_ACCOUNT_BALANCE: &str = "CTRP6548R";

    /// 국내 주식 잔고 조회 (실전)
    pub const KR_BALANCE_REAL: &str = "TTTC8434R";
    /// 국내 주식 잔고 조회 (모의)
    pub const KR_BALANCE_PAPER: &str = "VTTC8434R";

    /// 국내 주식 일자별 시세 (실전/모의 공통)
    pub const KR_DAILY_PRICE: &str = "FHKST01010400";

    /// 국내 휴장일 조회 (실전 전용)
    pub const KR_HOLIDAY: &str = "CTCA0903R";

    /// 주식 일별 주문체결 조회 (실전)
    pub const KR_DAILY_ORDERS_REAL: &str = "TTTC8001R";
    /// 주식 일별 주문체결 조회 (모의)
    pub const KR_DAILY_ORDERS_PAPER: &str = "VTTC8001R";
}

/// 주문체결 조회용 매도매수 구분 코드.
pub mod side_code {
    /// 전체
    pub const ALL: &str = "00";
    /// 매도
    pub const SELL: &str = "01";
    /// 매수
    pub const BUY: &str = "02";
}
