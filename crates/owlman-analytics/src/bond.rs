//! 채권 매매 손익 계산.
//!
//! 일별 주문체결에서 채권(상품유형 `302`) 매수/매도를 분리해 짝을 짓고,
//! 수수료와 이표 수익을 반영한 매매 수익률(연환산)을 계산합니다.
//! 아직 매도하지 않은 채권은 만기 보유 또는 특정일 매도 시의 예상 수익을
//! 계산할 수 있습니다.
//!
//! 단가는 모두 액면 1,000원 기준입니다 (시세 API의 현재가는 10,000원 기준이라
//! 10으로 나눠 사용).

use chrono::NaiveDate;
use futures::future::try_join_all;
use owlman_exchange::{
    AccountDataSource, BondDataSource, BondInfo, KrOrderExecution, REDEMPTION_PRICE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, AnalyticsResult};

/// 채권 상품유형코드.
pub const BOND_PRODUCT_TYPE: &str = "302";

/// 이자소득세율.
pub const INTEREST_TAX_RATE: Decimal = dec!(0.154);

/// 잔존 일수별 매매 수수료율.
///
/// | 잔존 일수 | 수수료율 |
/// |-----------|----------|
/// | 90일 미만 | 0.0052% |
/// | 365일 미만 | 0.0152% |
/// | 730일 미만 | 0.0252% |
/// | 그 외 | 0.0352% |
pub fn trading_fee_rate(days_to_maturity: i64) -> Decimal {
    match days_to_maturity {
        d if d < 90 => dec!(0.000052),
        d if d < 365 => dec!(0.000152),
        d if d < 730 => dec!(0.000252),
        _ => dec!(0.000352),
    }
}

/// `(start, end]` 기간에 지급되는 이자 합계 (액면 10,000원 기준).
pub fn interest_between(info: &BondInfo, start: NaiveDate, end: NaiveDate, tax: bool) -> Decimal {
    let gross: Decimal = info
        .coupons
        .iter()
        .filter(|c| c.date > start && c.date <= end)
        .map(|c| c.amount)
        .sum();
    if tax {
        gross * (Decimal::ONE - INTEREST_TAX_RATE)
    } else {
        gross
    }
}

fn fee(info: &BondInfo, price: Decimal, on: NaiveDate) -> Decimal {
    price * trading_fee_rate((info.maturity - on).num_days())
}

/// 연환산 수익률 (%). 보유 일수가 0 이하이거나 매수 단가가 0이면 `None`.
fn annualized_yield(profit: Decimal, buy_price: Decimal, days: i64) -> Option<Decimal> {
    if days <= 0 {
        return None;
    }
    profit
        .checked_div(buy_price)?
        .checked_mul(dec!(365))?
        .checked_div(Decimal::from(days))?
        .checked_mul(dec!(100))
}

/// 채권 체결 한 건 (매수 또는 매도).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondLot {
    /// 유일 주문 코드
    pub order_code: String,
    /// 상품번호
    pub code: String,
    /// 상품명
    pub name: String,
    /// 주문일자
    pub date: NaiveDate,
    /// 총체결수량
    pub quantity: Decimal,
    /// 평균 단가
    pub unit_price: Decimal,
}

impl BondLot {
    /// 주문체결에서 변환. 체결수량이 0이면 `None`.
    pub fn from_execution(exec: &KrOrderExecution) -> Option<Self> {
        Some(Self {
            order_code: exec.unique_code(),
            code: exec.product_no.clone(),
            name: exec.product_name.clone(),
            date: exec.order_date,
            quantity: exec.filled_qty,
            unit_price: exec.avg_unit_price()?,
        })
    }
}

/// 주문체결에서 채권 매수/매도 체결을 분리합니다.
pub fn split_bond_orders(orders: &[KrOrderExecution]) -> (Vec<BondLot>, Vec<BondLot>) {
    let mut buys = Vec::new();
    let mut sells = Vec::new();

    for exec in orders
        .iter()
        .filter(|o| o.product_type_code == BOND_PRODUCT_TYPE)
    {
        let Some(lot) = BondLot::from_execution(exec) else {
            continue;
        };
        if exec.is_buy() {
            buys.push(lot);
        } else if exec.is_sell() {
            sells.push(lot);
        }
    }

    (buys, sells)
}

/// 매수 한 건의 매매 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondTradeRecord {
    pub code: String,
    pub name: String,
    /// 만기일
    pub maturity: NaiveDate,
    /// 보유수량
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    /// 짝지어진 매도 주문 코드
    #[serde(skip)]
    pub sell_order_code: Option<String>,
    /// 매도일 (만기 상환 시 만기일, 미매도 시 없음)
    pub sell_date: Option<NaiveDate>,
    pub sell_price: Option<Decimal>,
    /// 이표 수익
    pub coupon_income: Decimal,
    /// 매매 수익
    pub profit: Decimal,
    /// 연환산 매매 수익률 (%)
    pub yield_rate: Option<Decimal>,
}

impl BondTradeRecord {
    /// 아직 매도(상환)되지 않은 기록.
    pub fn is_open(&self) -> bool {
        self.sell_date.is_none()
    }
}

/// 매수 한 건과 매도 후보들로 매매 기록을 만듭니다.
///
/// 매도 후보가 있으면 후보마다 수익률을 계산해 가장 높은 것을 고릅니다.
/// 없으면 만기가 지난 채권은 만기일에 1,000원으로 상환된 것으로 보고,
/// 그렇지 않으면 수익 0인 보유 중 기록을 만듭니다.
pub fn trade_record(
    info: &BondInfo,
    buy: &BondLot,
    sells: &[&BondLot],
    today: NaiveDate,
    tax: bool,
) -> BondTradeRecord {
    let buy_fee = fee(info, buy.unit_price, buy.date);

    let mut record = BondTradeRecord {
        code: buy.code.clone(),
        name: buy.name.clone(),
        maturity: info.maturity,
        quantity: buy.quantity,
        buy_date: buy.date,
        buy_price: buy.unit_price,
        sell_order_code: None,
        sell_date: None,
        sell_price: None,
        coupon_income: interest_between(info, buy.date, today, tax) / dec!(10),
        profit: Decimal::ZERO,
        yield_rate: Some(Decimal::ZERO),
    };

    if sells.is_empty() {
        if info.maturity < today {
            let profit = REDEMPTION_PRICE + record.coupon_income - buy.unit_price - buy_fee;
            record.sell_date = Some(info.maturity);
            record.sell_price = Some(REDEMPTION_PRICE);
            record.profit = profit;
            record.yield_rate = annualized_yield(
                profit,
                buy.unit_price,
                (info.maturity - buy.date).num_days(),
            );
        }
        return record;
    }

    let mut best: Option<BondTradeRecord> = None;
    for sell in sells {
        let sell_fee = fee(info, sell.unit_price, sell.date);
        let coupon = interest_between(info, buy.date, sell.date, tax) / dec!(10);
        let profit = sell.unit_price + coupon - buy.unit_price - buy_fee - sell_fee;
        let yield_rate =
            annualized_yield(profit, buy.unit_price, (sell.date - buy.date).num_days());

        // None은 가장 낮은 수익률로 취급
        let better = match &best {
            None => true,
            Some(b) => yield_rate > b.yield_rate,
        };
        if better {
            best = Some(BondTradeRecord {
                sell_order_code: Some(sell.order_code.clone()),
                sell_date: Some(sell.date),
                sell_price: Some(sell.unit_price),
                coupon_income: coupon,
                profit,
                yield_rate,
                ..record.clone()
            });
        }
    }

    best.unwrap_or(record)
}

/// 매수마다 같은 채권의 이후 매도와 짝을 지어 매매 기록을 만듭니다.
///
/// 매수 순서대로 처리하며, 짝지어진 매도의 남은 수량은 매수 수량만큼 줄어듭니다.
/// 남은 수량이 0 이하인 매도는 더 이상 후보가 되지 않습니다.
pub fn match_trades(
    infos: &HashMap<String, BondInfo>,
    buys: &[BondLot],
    sells: &[BondLot],
    today: NaiveDate,
    tax: bool,
) -> AnalyticsResult<Vec<BondTradeRecord>> {
    let mut remaining: Vec<Decimal> = sells.iter().map(|s| s.quantity).collect();
    let mut records = Vec::with_capacity(buys.len());

    for buy in buys {
        let info = infos.get(&buy.code).ok_or_else(|| {
            AnalyticsError::InsufficientData(format!("bond info missing for {}", buy.code))
        })?;

        let candidates: Vec<&BondLot> = sells
            .iter()
            .zip(&remaining)
            .filter(|(s, left)| s.code == buy.code && s.date > buy.date && **left > Decimal::ZERO)
            .map(|(s, _)| s)
            .collect();

        let record = trade_record(info, buy, &candidates, today, tax);

        if let Some(order_code) = &record.sell_order_code {
            if let Some(i) = sells.iter().position(|s| &s.order_code == order_code) {
                remaining[i] -= buy.quantity;
            }
        }
        records.push(record);
    }

    Ok(records)
}

/// 예상 수익 계산 파라미터.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictParams {
    /// 상품명 필터
    pub name: Option<String>,
    /// 매도 가격 (액면 10,000원 기준, 없으면 현재가)
    pub price: Option<Decimal>,
    /// 이 수익률(%)을 넘는 기록만 남김
    pub min_yield: Decimal,
    /// 매도일 (없으면 오늘)
    pub sell_date: Option<NaiveDate>,
    /// 만기 보유 가정
    pub hold: bool,
    /// 이자소득세 적용
    pub tax: bool,
}

/// 보유 채권의 예상 매도 수익.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningPrediction {
    pub code: String,
    pub name: String,
    pub maturity: NaiveDate,
    pub quantity: Decimal,
    pub buy_date: NaiveDate,
    pub buy_price: Decimal,
    pub sell_date: NaiveDate,
    pub sell_price: Decimal,
    pub coupon_income: Decimal,
    pub profit: Decimal,
    /// 연환산 매매 수익률 (%)
    pub yield_rate: Option<Decimal>,
}

/// 미매도 기록의 예상 수익을 계산합니다 (수익률 내림차순).
pub fn predict_earnings(
    records: &[BondTradeRecord],
    infos: &HashMap<String, BondInfo>,
    params: &PredictParams,
    today: NaiveDate,
) -> AnalyticsResult<Vec<EarningPrediction>> {
    let mut predictions = Vec::new();

    for record in records.iter().filter(|r| r.is_open()) {
        if let Some(name) = &params.name {
            if &record.name != name {
                continue;
            }
        }

        let info = infos.get(&record.code).ok_or_else(|| {
            AnalyticsError::InsufficientData(format!("bond info missing for {}", record.code))
        })?;

        let (sell_date, sell_price) = if params.hold {
            (info.maturity, REDEMPTION_PRICE)
        } else {
            let price = params.price.unwrap_or(info.current_price);
            (params.sell_date.unwrap_or(today), price / dec!(10))
        };

        let buy_fee = fee(info, record.buy_price, record.buy_date);
        let sell_fee = if info.maturity <= sell_date {
            Decimal::ZERO
        } else {
            fee(info, sell_price, sell_date)
        };
        let coupon_income = interest_between(info, record.buy_date, sell_date, params.tax) / dec!(10);
        let profit = sell_price + coupon_income - record.buy_price - buy_fee - sell_fee;
        let yield_rate = annualized_yield(
            profit,
            record.buy_price,
            (sell_date - record.buy_date).num_days(),
        );

        predictions.push(EarningPrediction {
            code: record.code.clone(),
            name: record.name.clone(),
            maturity: info.maturity,
            quantity: record.quantity,
            buy_date: record.buy_date,
            buy_price: record.buy_price,
            sell_date,
            sell_price,
            coupon_income,
            profit,
            yield_rate,
        });
    }

    predictions.retain(|p| p.yield_rate.is_some_and(|y| y > params.min_yield));
    predictions.sort_by(|a, b| b.yield_rate.cmp(&a.yield_rate));
    Ok(predictions)
}

/// 채권 정보 소스를 사용하는 매매 손익 분석기.
pub struct BondAnalyzer<B: BondDataSource> {
    source: B,
    tax: bool,
}

impl<B: BondDataSource> BondAnalyzer<B> {
    pub fn new(source: B) -> Self {
        Self { source, tax: false }
    }

    pub fn source(&self) -> &B {
        &self.source
    }

    /// 이자소득세 적용 여부.
    pub fn with_tax(mut self, tax: bool) -> Self {
        self.tax = tax;
        self
    }

    /// 코드별 채권 정보를 조회합니다 (중복 제거).
    pub async fn load_infos<'a>(
        &self,
        codes: impl IntoIterator<Item = &'a str>,
    ) -> AnalyticsResult<HashMap<String, BondInfo>> {
        let unique: BTreeSet<&str> = codes.into_iter().collect();
        let infos = try_join_all(unique.into_iter().map(|code| self.source.bond_info(code))).await?;
        Ok(infos.into_iter().map(|i| (i.code.clone(), i)).collect())
    }

    /// 기간 내 채권 매매 기록.
    pub async fn trading_result(
        &self,
        account: &dyn AccountDataSource,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> AnalyticsResult<(Vec<BondTradeRecord>, HashMap<String, BondInfo>)> {
        let orders = account.daily_orders(start, end).await?;
        let (buys, sells) = split_bond_orders(&orders);
        info!(
            orders = orders.len(),
            buys = buys.len(),
            sells = sells.len(),
            "Bond orders loaded"
        );

        let infos = self
            .load_infos(buys.iter().map(|b| b.code.as_str()))
            .await?;
        let records = match_trades(&infos, &buys, &sells, today, self.tax)?;

        let unmatched = sells
            .iter()
            .filter(|s| !records.iter().any(|r| r.sell_order_code.as_ref() == Some(&s.order_code)))
            .count();
        if unmatched > 0 {
            warn!(unmatched, "Sell orders without a matching buy in range");
        }
        debug!(records = records.len(), "Bond trades matched");

        Ok((records, infos))
    }

    /// 미매도 기록의 예상 수익.
    pub fn predict(
        &self,
        records: &[BondTradeRecord],
        infos: &HashMap<String, BondInfo>,
        params: &PredictParams,
        today: NaiveDate,
    ) -> AnalyticsResult<Vec<EarningPrediction>> {
        predict_earnings(records, infos, params, today)
    }
}
