//! 상관행렬의 2차원 산점도 좌표 (주성분 분석).
//!
//! 상관행렬의 각 행을 표본으로 보고 열 평균을 뺀 뒤, 공분산 행렬의
//! 상위 두 고유벡터(거듭제곱법 + 디플레이션)에 투영합니다.

use owlman_core::Universe;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationMatrix;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-12;

/// 산점도의 한 점.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub market_cap: Option<Decimal>,
    /// 제1주성분 좌표
    pub x: f64,
    /// 제2주성분 좌표
    pub y: f64,
}

/// 상관행렬을 2차원 좌표로 투영하고 종목 정보를 붙입니다.
///
/// 유니버스에 없는 코드는 이름을 코드로 대신합니다.
pub fn correlation_scatter(corr: &CorrelationMatrix, universe: &Universe) -> Vec<ScatterPoint> {
    let coords = principal_components(&corr.matrix, 2);

    corr.symbols
        .iter()
        .zip(coords)
        .map(|(code, xy)| {
            let instrument = universe.get(code);
            ScatterPoint {
                code: code.clone(),
                name: instrument.map_or_else(|| code.clone(), |i| i.name.clone()),
                category: instrument.and_then(|i| i.category.clone()),
                market_cap: instrument.and_then(|i| i.market_cap),
                x: xy[0],
                y: xy[1],
            }
        })
        .collect()
}

/// 행 단위 표본을 상위 `k`개 주성분에 투영한 좌표.
///
/// 분산이 남지 않은 성분의 좌표는 0입니다.
pub fn principal_components(data: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut coords = vec![vec![0.0; k]; n];
    if n < 2 {
        return coords;
    }
    let dim = data[0].len();

    // 열 평균 제거
    let means: Vec<f64> = (0..dim)
        .map(|c| data.iter().map(|row| row[c]).sum::<f64>() / n as f64)
        .collect();
    let centered: Vec<Vec<f64>> = data
        .iter()
        .map(|row| row.iter().zip(&means).map(|(v, m)| v - m).collect())
        .collect();

    let mut cov = vec![vec![0.0; dim]; dim];
    for a in 0..dim {
        for b in a..dim {
            let s = centered.iter().map(|row| row[a] * row[b]).sum::<f64>() / (n - 1) as f64;
            cov[a][b] = s;
            cov[b][a] = s;
        }
    }

    for component in 0..k.min(dim) {
        let Some((eigenvalue, vector)) = dominant_eigenpair(&cov) else {
            break;
        };

        for (row, out) in centered.iter().zip(coords.iter_mut()) {
            out[component] = row.iter().zip(&vector).map(|(a, b)| a * b).sum();
        }

        // 디플레이션
        for a in 0..dim {
            for b in 0..dim {
                cov[a][b] -= eigenvalue * vector[a] * vector[b];
            }
        }
    }

    coords
}

/// 가장 큰 고유값과 고유벡터 (절댓값이 가장 큰 성분이 양수가 되도록 부호 고정).
fn dominant_eigenpair(matrix: &[Vec<f64>]) -> Option<(f64, Vec<f64>)> {
    let dim = matrix.len();

    // 노름이 가장 큰 열에서 시작
    let start = (0..dim)
        .map(|c| (c, matrix.iter().map(|row| row[c] * row[c]).sum::<f64>()))
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    if start.1.sqrt() <= TOLERANCE {
        return None;
    }
    let mut vector: Vec<f64> = matrix.iter().map(|row| row[start.0]).collect();
    normalize(&mut vector)?;

    for _ in 0..MAX_ITERATIONS {
        let mut next = mat_vec(matrix, &vector);
        normalize(&mut next)?;
        let delta: f64 = next
            .iter()
            .zip(&vector)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        vector = next;
        if delta < TOLERANCE {
            break;
        }
    }

    let eigenvalue: f64 = mat_vec(matrix, &vector)
        .iter()
        .zip(&vector)
        .map(|(a, b)| a * b)
        .sum();
    if eigenvalue <= TOLERANCE {
        return None;
    }

    let pivot = vector
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        vector.iter_mut().for_each(|v| *v = -*v);
    }

    Some((eigenvalue, vector))
}

fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
        .collect()
}

fn normalize(vector: &mut [f64]) -> Option<()> {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm <= TOLERANCE || !norm.is_finite() {
        return None;
    }
    vector.iter_mut().for_each(|v| *v /= norm);
    Some(())
}
