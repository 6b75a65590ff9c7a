//! 변동성 지표 (Volatility Indicators).
//!
//! - True Range (실제 범위)
//! - 지수 가중 평균 (편향 보정 가중치)
//! - 위험도: ATR / 최근 종가

use owlman_core::DailyBar;
use rust_decimal::prelude::ToPrimitive;

use super::{IndicatorError, IndicatorResult};

/// 일봉별 True Range.
///
/// `max(고가, 전일 종가) - min(저가, 전일 종가)`. 첫 일봉은 `고가 - 저가`입니다.
pub fn true_range(bars: &[DailyBar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;

    bars.iter()
        .map(|bar| {
            let high = bar.high.to_f64().unwrap_or(f64::NAN);
            let low = bar.low.to_f64().unwrap_or(f64::NAN);
            let tr = match prev_close {
                Some(pc) => high.max(pc) - low.min(pc),
                None => high - low,
            };
            prev_close = bar.close.to_f64();
            tr
        })
        .collect()
}

/// 지수 가중 평균의 마지막 값 (편향 보정 가중치).
///
/// 시점 `t`의 값은 `Σ (1-α)^(t-i) x_i / Σ (1-α)^(t-i)`이며, 결측값(`None`)은
/// 위치는 유지한 채 합에서만 빠집니다. 유효한 값이 없으면 `None`.
pub fn ewm_mean(values: &[Option<f64>], alpha: f64) -> IndicatorResult<Option<f64>> {
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(IndicatorError::InvalidParameter(format!(
            "alpha must be in (0, 1], got {}",
            alpha
        )));
    }

    let decay = 1.0 - alpha;
    let last = values.len();
    let mut weighted = 0.0;
    let mut weights = 0.0;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = value.filter(|x| x.is_finite()) else {
            continue;
        };
        let w = decay.powi((last - 1 - i) as i32);
        weighted += w * x;
        weights += w;
    }

    Ok((weights > 0.0).then(|| weighted / weights))
}

/// 위험도 (가격 대비 ATR 비율).
///
/// # 인자
/// * `tr_window` - 정렬된 True Range 구간 (결측 허용)
/// * `last_close` - 최근 종가
/// * `alpha` - 평활 계수
///
/// 최근 종가가 없거나 0이면 `None`.
pub fn risk_estimate(
    tr_window: &[Option<f64>],
    last_close: Option<f64>,
    alpha: f64,
) -> IndicatorResult<Option<f64>> {
    let atr = ewm_mean(tr_window, alpha)?;
    Ok(match (atr, last_close) {
        (Some(atr), Some(close)) if close != 0.0 && close.is_finite() => Some(atr / close),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(day: u32, high: Decimal, low: Decimal, close: Decimal) -> DailyBar {
        DailyBar::new(
            NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            close,
            high,
            low,
            close,
            0,
        )
    }

    #[test]
    fn test_true_range_uses_prev_close() {
        let bars = vec![
            bar(1, dec!(105), dec!(95), dec!(100)),
            // 갭 상승: 전일 종가 100이 저가보다 낮음
            bar(2, dec!(115), dec!(108), dec!(110)),
            // 갭 하락: 전일 종가 110이 고가보다 높음
            bar(3, dec!(104), dec!(98), dec!(100)),
        ];
        assert_eq!(true_range(&bars), vec![10.0, 15.0, 12.0]);
        assert!(true_range(&[]).is_empty());
    }

    #[test]
    fn test_ewm_adjusted_weights() {
        // alpha = 0.5: (0.25*1 + 0.5*2 + 1*3) / 1.75
        let v = ewm_mean(&[Some(1.0), Some(2.0), Some(3.0)], 0.5).unwrap().unwrap();
        assert!((v - 4.25 / 1.75).abs() < 1e-12);

        // 결측값은 위치를 유지: (0.25*1 + 1*3) / 1.25
        let v = ewm_mean(&[Some(1.0), None, Some(3.0)], 0.5).unwrap().unwrap();
        assert!((v - 3.25 / 1.25).abs() < 1e-12);

        assert_eq!(ewm_mean(&[None, None], 0.5).unwrap(), None);
        assert!(matches!(
            ewm_mean(&[Some(1.0)], 0.0),
            Err(IndicatorError::InvalidParameter(_))
        ));
        assert!(matches!(
            ewm_mean(&[Some(1.0)], 1.5),
            Err(IndicatorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_risk_estimate() {
        let window = vec![Some(2.0); 5];
        let risk = risk_estimate(&window, Some(100.0), 2.0 / 22.0).unwrap();
        assert!((risk.unwrap() - 0.02).abs() < 1e-12);

        assert_eq!(risk_estimate(&window, Some(0.0), 0.1).unwrap(), None);
        assert_eq!(risk_estimate(&window, None, 0.1).unwrap(), None);
        assert_eq!(risk_estimate(&[], Some(100.0), 0.1).unwrap(), None);
    }
}
