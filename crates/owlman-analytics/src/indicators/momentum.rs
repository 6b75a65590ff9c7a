//! 다기간 모멘텀 점수.
//!
//! 기간 `w`마다 최근 `w`개 일봉 구간의 첫 종가 대비 마지막 종가 비율을 구하고
//! 유효한 비율의 산술 평균을 점수로 사용합니다. 1보다 크면 상승 모멘텀입니다.

/// 기본 모멘텀 기간 (거래일, 피보나치 수열).
pub const DEFAULT_PERIODS: [usize; 6] = [2, 3, 5, 8, 13, 21];

/// 모멘텀 점수 계산.
///
/// 이력이 기간보다 짧거나 기준 종가가 0 또는 유한하지 않은 기간은 건너뜁니다.
/// 유효한 기간이 하나도 없으면 0을 반환합니다.
///
/// # 인자
/// * `closes` - 종가 (거래일 오름차순)
/// * `periods` - 참조 기간들 (일 단위)
pub fn momentum_score(closes: &[f64], periods: &[usize]) -> f64 {
    let n = closes.len();
    let Some(&last) = closes.last() else {
        return 0.0;
    };

    let ratios: Vec<f64> = periods
        .iter()
        .filter(|&&w| w >= 1 && w <= n)
        .filter_map(|&w| {
            let base = closes[n - w];
            if base == 0.0 || !base.is_finite() {
                return None;
            }
            let ratio = last / base;
            ratio.is_finite().then_some(ratio)
        })
        .collect();

    if ratios.is_empty() {
        0.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}
