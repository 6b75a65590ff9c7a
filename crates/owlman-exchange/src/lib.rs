//! 증권사 연결 및 외부 데이터 제공자.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 한국투자증권(KIS) 국내 주식 REST 클라이언트
//! - 네이버 금융 ETF 목록 제공자
//! - 신한투자증권 채권 발행/시세 정보 제공자
//! - 분석 계층이 사용하는 데이터 소스 trait

pub mod connector;
pub mod error;
pub mod provider;
pub mod traits;

pub use connector::kis::{
    AssetBalanceRow, DailyOrderPage, DailyOrderQuery, KisAccountType, KisConfig,
    KisEnvironment, KisKrClient, KisOAuth, KrHolding, KrOrderExecution,
};
pub use error::*;
pub use provider::{
    BondInfo, CouponPayment, EtfCategory, EtfItem, NaverEtfProvider, ShinhanBondProvider,
    REDEMPTION_PRICE,
};
pub use traits::*;
