//! 일봉과 종목별 가격 이력.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 일봉 (OHLCV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 누적 거래량
    pub volume: u64,
}

impl DailyBar {
    /// 새 일봉을 생성합니다.
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: u64,
    ) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// 한 종목의 일봉 이력 (거래일 오름차순).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// 종목 코드
    pub code: String,
    bars: Vec<DailyBar>,
}

impl PriceHistory {
    /// 일봉 목록으로 이력을 생성합니다.
    ///
    /// 날짜 오름차순으로 정렬하고, 같은 날짜가 여러 번 나오면 마지막 값을 남깁니다.
    pub fn new(code: impl Into<String>, mut bars: Vec<DailyBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<DailyBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            code: code.into(),
            bars: deduped,
        }
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 가장 최근 종가.
    pub fn last_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }

    /// 종가 시계열을 f64로 변환합니다.
    pub fn closes_f64(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.close.to_f64().unwrap_or(f64::NAN))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal) -> DailyBar {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        DailyBar::new(date, close, close, close, close, 100)
    }

    #[test]
    fn test_history_sorted_and_deduped() {
        let history = PriceHistory::new(
            "069500",
            vec![bar(5, dec!(3)), bar(1, dec!(1)), bar(5, dec!(4)), bar(3, dec!(2))],
        );

        let dates: Vec<u32> = history
            .bars()
            .iter()
            .map(|b| chrono::Datelike::day(&b.date))
            .collect();
        assert_eq!(dates, vec![1, 3, 5]);
        assert_eq!(history.last_close(), Some(dec!(4)));
        assert_eq!(history.closes_f64(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_empty_history() {
        let history = PriceHistory::new("000000", vec![]);
        assert!(history.is_empty());
        assert_eq!(history.last_close(), None);
    }
}
