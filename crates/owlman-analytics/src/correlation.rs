//! True Range 정렬과 상관계수 계산.
//!
//! 종목별 True Range를 거래일 합집합 기준으로 정렬한 뒤 최근 구간만 남기고,
//! 쌍별로 함께 관측된 값만 사용해 Pearson 상관계수를 계산합니다.
//!
//! # 예시
//!
//! ```rust,ignore
//! use owlman_analytics::correlation::{correlation_matrix, TrueRangeFrame};
//!
//! let frame = TrueRangeFrame::from_histories(&histories, 21);
//! let corr = correlation_matrix(&frame);
//! println!("{:.4}", corr.get(0, 1));
//! ```

use chrono::NaiveDate;
use owlman_core::PriceHistory;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::indicators::true_range;

/// 거래일 기준으로 정렬된 종목별 True Range 구간.
#[derive(Debug, Clone, Default)]
pub struct TrueRangeFrame {
    codes: Vec<String>,
    dates: Vec<NaiveDate>,
    /// 종목별 열 (dates와 같은 길이, 해당 거래일 일봉이 없으면 None)
    columns: Vec<Vec<Option<f64>>>,
}

impl TrueRangeFrame {
    /// 가격 이력들로 정렬된 True Range 구간을 만듭니다.
    ///
    /// True Range는 종목별 전체 이력으로 계산한 뒤, 모든 종목의 거래일 합집합에서
    /// 마지막 `lookback`개 거래일만 남깁니다.
    pub fn from_histories<'a>(
        histories: impl IntoIterator<Item = &'a PriceHistory>,
        lookback: usize,
    ) -> Self {
        let mut codes = Vec::new();
        let mut series: Vec<HashMap<NaiveDate, f64>> = Vec::new();
        let mut all_dates = BTreeSet::new();

        for history in histories {
            let tr = true_range(history.bars());
            let by_date: HashMap<NaiveDate, f64> = history
                .bars()
                .iter()
                .zip(tr)
                .map(|(bar, value)| (bar.date, value))
                .collect();
            all_dates.extend(by_date.keys().copied());
            codes.push(history.code.clone());
            series.push(by_date);
        }

        let skip = all_dates.len().saturating_sub(lookback);
        let dates: Vec<NaiveDate> = all_dates.into_iter().skip(skip).collect();

        let columns = series
            .iter()
            .map(|by_date| {
                dates
                    .iter()
                    .map(|d| by_date.get(d).copied().filter(|v| v.is_finite()))
                    .collect()
            })
            .collect();

        Self {
            codes,
            dates,
            columns,
        }
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// i번째 종목의 True Range 열.
    pub fn column(&self, i: usize) -> &[Option<f64>] {
        &self.columns[i]
    }

    /// 종목 코드로 열을 찾습니다.
    pub fn column_for(&self, code: &str) -> Option<&[Option<f64>]> {
        self.codes
            .iter()
            .position(|c| c == code)
            .map(|i| self.columns[i].as_slice())
    }

    /// 종목 수.
    pub fn width(&self) -> usize {
        self.codes.len()
    }

    /// 거래일 수.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// 상관행렬 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// 종목 목록 (행/열 순서)
    pub symbols: Vec<String>,
    /// 상관계수 행렬 (N×N, -1.0 ~ 1.0)
    pub matrix: Vec<Vec<f64>>,
    /// 분석 기간 (거래일 수)
    pub period: usize,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[i][j]
    }
}

/// 결측값을 제외한 쌍별 Pearson 상관계수.
///
/// 두 시계열 모두 값이 있는 위치만 사용합니다. 그런 위치가 2개 미만이거나
/// 한쪽 분산이 0이면 `None`.
pub fn pearson_pairwise(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // 변동 없음
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let corr = cov / (var_x.sqrt() * var_y.sqrt());
    corr.is_finite().then(|| corr.clamp(-1.0, 1.0))
}

/// True Range 구간의 상관행렬.
///
/// 계산할 수 없는 쌍은 0.0, 대각선은 1.0입니다.
pub fn correlation_matrix(frame: &TrueRangeFrame) -> CorrelationMatrix {
    let n = frame.width();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let corr = pearson_pairwise(frame.column(i), frame.column(j)).unwrap_or(0.0);
            matrix[i][j] = corr;
            matrix[j][i] = corr; // 대칭
        }
    }

    CorrelationMatrix {
        symbols: frame.codes().to_vec(),
        matrix,
        period: frame.len(),
    }
}
