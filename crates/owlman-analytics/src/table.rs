//! 결과 테이블 (polars DataFrame)과 CSV 저장.
//!
//! 열 이름은 화면/CSV에 그대로 쓰이므로 한글을 사용합니다.

use chrono::NaiveDate;
use owlman_exchange::{AssetBalanceRow, EtfItem, KrHolding};
use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;

use crate::bond::{BondTradeRecord, EarningPrediction};
use crate::error::AnalyticsResult;
use crate::screening::ScreenRow;

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn opt_f64(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|v| v.to_f64())
}

fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 진입 테이블.
pub fn screen_frame(rows: &[ScreenRow]) -> PolarsResult<DataFrame> {
    df!(
        "그룹" => rows.iter().map(|r| r.group_number() as u32).collect::<Vec<_>>(),
        "종목코드" => rows.iter().map(|r| r.code.clone()).collect::<Vec<_>>(),
        "종목명" => rows.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        "점수" => rows.iter().map(ScreenRow::score_display).collect::<Vec<_>>(),
        "위험" => rows.iter().map(ScreenRow::risk_percent).collect::<Vec<_>>(),
        "보유" => rows.iter().map(|r| r.held_mark()).collect::<Vec<_>>(),
        "진입" => rows.iter().map(|r| r.entry).collect::<Vec<_>>()
    )
}

/// 군집 구성표: (그룹 번호, 종목코드, 종목명).
pub fn cluster_frame(entries: &[(usize, String, String)]) -> PolarsResult<DataFrame> {
    df!(
        "그룹" => entries.iter().map(|e| e.0 as u32).collect::<Vec<_>>(),
        "종목코드" => entries.iter().map(|e| e.1.clone()).collect::<Vec<_>>(),
        "종목명" => entries.iter().map(|e| e.2.clone()).collect::<Vec<_>>()
    )
}

/// ETF 목록.
pub fn etf_frame(items: &[EtfItem]) -> PolarsResult<DataFrame> {
    df!(
        "종목코드" => items.iter().map(|i| i.code.clone()).collect::<Vec<_>>(),
        "카테고리" => items
            .iter()
            .map(|i| i.category().map(|c| c.label().to_string()))
            .collect::<Vec<_>>(),
        "종목명" => items.iter().map(|i| i.name.clone()).collect::<Vec<_>>(),
        "현재가" => items.iter().map(|i| to_f64(i.price)).collect::<Vec<_>>(),
        "등락구분" => items.iter().map(|i| i.rise_fall_symbol()).collect::<Vec<_>>(),
        "전일비" => items.iter().map(|i| to_f64(i.change)).collect::<Vec<_>>(),
        "등락률" => items.iter().map(|i| to_f64(i.change_rate)).collect::<Vec<_>>(),
        "순자산가치(NAV)" => items.iter().map(|i| opt_f64(i.nav)).collect::<Vec<_>>(),
        "3개월수익률" => items.iter().map(|i| opt_f64(i.three_month_return)).collect::<Vec<_>>(),
        "거래량" => items.iter().map(|i| to_f64(i.volume)).collect::<Vec<_>>(),
        "거래대금(백만)" => items.iter().map(|i| to_f64(i.trading_value)).collect::<Vec<_>>(),
        "시가총액(억)" => items.iter().map(|i| to_f64(i.market_cap)).collect::<Vec<_>>()
    )
}

/// 자산 현황.
pub fn balance_frame(rows: &[AssetBalanceRow]) -> PolarsResult<DataFrame> {
    df!(
        "자산구분" => rows.iter().map(|r| r.asset_class.clone()).collect::<Vec<_>>(),
        "매입금액" => rows.iter().map(|r| to_f64(r.purchase_amount)).collect::<Vec<_>>(),
        "평가금액" => rows.iter().map(|r| to_f64(r.eval_amount)).collect::<Vec<_>>(),
        "평가손익금액" => rows.iter().map(|r| to_f64(r.eval_profit_loss)).collect::<Vec<_>>(),
        "신용대출금액" => rows.iter().map(|r| to_f64(r.credit_loan_amount)).collect::<Vec<_>>(),
        "실제순자산금액" => rows.iter().map(|r| to_f64(r.real_net_assets)).collect::<Vec<_>>(),
        "전체비중율" => rows.iter().map(|r| to_f64(r.total_weight_rate)).collect::<Vec<_>>()
    )
}

/// 보유 종목.
pub fn holdings_frame(holdings: &[KrHolding]) -> PolarsResult<DataFrame> {
    df!(
        "종목코드" => holdings.iter().map(|h| h.stock_code.clone()).collect::<Vec<_>>(),
        "종목명" => holdings.iter().map(|h| h.stock_name.clone()).collect::<Vec<_>>(),
        "보유수량" => holdings.iter().map(|h| to_f64(h.quantity)).collect::<Vec<_>>(),
        "매입평균가격" => holdings.iter().map(|h| to_f64(h.avg_price)).collect::<Vec<_>>(),
        "현재가" => holdings.iter().map(|h| to_f64(h.current_price)).collect::<Vec<_>>(),
        "평가금액" => holdings.iter().map(|h| to_f64(h.eval_amount)).collect::<Vec<_>>(),
        "평가손익금액" => holdings.iter().map(|h| to_f64(h.profit_loss)).collect::<Vec<_>>()
    )
}

/// 채권 매매 기록.
pub fn bond_trade_frame(records: &[BondTradeRecord]) -> PolarsResult<DataFrame> {
    df!(
        "상품번호" => records.iter().map(|r| r.code.clone()).collect::<Vec<_>>(),
        "상품명" => records.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        "만기일" => records.iter().map(|r| date_str(r.maturity)).collect::<Vec<_>>(),
        "보유수량" => records.iter().map(|r| to_f64(r.quantity)).collect::<Vec<_>>(),
        "매수일자" => records.iter().map(|r| date_str(r.buy_date)).collect::<Vec<_>>(),
        "매수단가" => records.iter().map(|r| to_f64(r.buy_price)).collect::<Vec<_>>(),
        "매도일자" => records.iter().map(|r| r.sell_date.map(date_str)).collect::<Vec<_>>(),
        "매도단가" => records.iter().map(|r| opt_f64(r.sell_price)).collect::<Vec<_>>(),
        "이표수익" => records.iter().map(|r| to_f64(r.coupon_income)).collect::<Vec<_>>(),
        "매매수익" => records.iter().map(|r| to_f64(r.profit)).collect::<Vec<_>>(),
        "매매수익률" => records.iter().map(|r| opt_f64(r.yield_rate)).collect::<Vec<_>>()
    )
}

/// 채권 예상 매도 수익.
pub fn prediction_frame(predictions: &[EarningPrediction]) -> PolarsResult<DataFrame> {
    df!(
        "상품번호" => predictions.iter().map(|p| p.code.clone()).collect::<Vec<_>>(),
        "상품명" => predictions.iter().map(|p| p.name.clone()).collect::<Vec<_>>(),
        "만기일" => predictions.iter().map(|p| date_str(p.maturity)).collect::<Vec<_>>(),
        "보유수량" => predictions.iter().map(|p| to_f64(p.quantity)).collect::<Vec<_>>(),
        "매수일자" => predictions.iter().map(|p| date_str(p.buy_date)).collect::<Vec<_>>(),
        "매수단가" => predictions.iter().map(|p| to_f64(p.buy_price)).collect::<Vec<_>>(),
        "매도일자" => predictions.iter().map(|p| date_str(p.sell_date)).collect::<Vec<_>>(),
        "매도단가" => predictions.iter().map(|p| to_f64(p.sell_price)).collect::<Vec<_>>(),
        "이표수익" => predictions.iter().map(|p| to_f64(p.coupon_income)).collect::<Vec<_>>(),
        "매매수익" => predictions.iter().map(|p| to_f64(p.profit)).collect::<Vec<_>>(),
        "매매수익률" => predictions.iter().map(|p| opt_f64(p.yield_rate)).collect::<Vec<_>>()
    )
}

/// DataFrame을 CSV 파일로 저장합니다 (헤더 포함).
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> AnalyticsResult<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    tracing::info!(path = %path.display(), rows = df.height(), "CSV saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, entry: u64) -> ScreenRow {
        ScreenRow {
            group: 2,
            code: code.into(),
            name: format!("{} ETF", code),
            score: 1.04567,
            risk: Some(0.0123),
            held: true,
            buffered: true,
            entry,
        }
    }

    #[test]
    fn test_screen_frame_columns() {
        let df = screen_frame(&[row("A", 1_000_000), row("B", 0)]).unwrap();
        assert_eq!(df.shape(), (2, 7));
        assert_eq!(
            df.get_column_names_str(),
            vec!["그룹", "종목코드", "종목명", "점수", "위험", "보유", "진입"]
        );

        let cell = |name: &str| df.column(name).unwrap().get(0).unwrap();
        assert_eq!(cell("그룹"), AnyValue::UInt32(3));
        assert_eq!(cell("점수"), AnyValue::Float64(1.045));
        assert_eq!(cell("위험"), AnyValue::Float64(1.23));
        assert_eq!(cell("진입"), AnyValue::UInt64(1_000_000));
    }

    #[test]
    fn test_write_csv() {
        let entries = vec![
            (1, "069500".to_string(), "KODEX 200".to_string()),
            (2, "148070".to_string(), "KOSEF 국고채10년".to_string()),
        ];
        let mut df = cluster_frame(&entries).unwrap();

        let path = std::env::temp_dir().join(format!("owlman-cluster-{}.csv", std::process::id()));
        write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("그룹,종목코드,종목명"));
        assert_eq!(lines.next(), Some("1,069500,KODEX 200"));
        assert_eq!(lines.count(), 1);
    }
}
