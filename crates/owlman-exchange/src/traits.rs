//! 분석 계층이 사용하는 데이터 소스 trait.
//!
//! 분석 코드는 구체적인 HTTP 클라이언트 대신 이 trait에 의존하므로
//! 테스트에서는 메모리 구현으로 대체할 수 있습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use owlman_core::PriceHistory;

use crate::connector::kis::{
    AssetBalanceRow, DailyOrderQuery, KisKrClient, KrHolding, KrOrderExecution,
};
use crate::provider::{BondInfo, ShinhanBondProvider};
use crate::ExchangeError;

/// 외부 API 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 일봉 시세 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 종목의 최근 일봉 이력 (거래일 오름차순).
    async fn daily_history(&self, code: &str) -> ExchangeResult<PriceHistory>;
}

/// 계좌 정보 소스.
#[async_trait]
pub trait AccountDataSource: Send + Sync {
    /// 보유 종목 (수량 > 0).
    async fn stock_holdings(&self) -> ExchangeResult<Vec<KrHolding>>;

    /// 자산 구분별 자산현황.
    async fn asset_balance(&self) -> ExchangeResult<Vec<AssetBalanceRow>>;

    /// 기간 내 체결된 주문 전체.
    async fn daily_orders(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ExchangeResult<Vec<KrOrderExecution>>;
}

/// 채권 발행/시세 정보 소스.
#[async_trait]
pub trait BondDataSource: Send + Sync {
    async fn bond_info(&self, code: &str) -> ExchangeResult<BondInfo>;
}

#[async_trait]
impl MarketDataSource for KisKrClient {
    async fn daily_history(&self, code: &str) -> ExchangeResult<PriceHistory> {
        self.get_daily_price(code).await
    }
}

#[async_trait]
impl AccountDataSource for KisKrClient {
    async fn stock_holdings(&self) -> ExchangeResult<Vec<KrHolding>> {
        self.get_stock_balance().await
    }

    async fn asset_balance(&self) -> ExchangeResult<Vec<AssetBalanceRow>> {
        self.get_account_balance().await
    }

    async fn daily_orders(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ExchangeResult<Vec<KrOrderExecution>> {
        self.get_all_daily_orders(&DailyOrderQuery::new(start_date, end_date))
            .await
    }
}

#[async_trait]
impl BondDataSource for ShinhanBondProvider {
    async fn bond_info(&self, code: &str) -> ExchangeResult<BondInfo> {
        self.get_bond_info(code).await
    }
}
