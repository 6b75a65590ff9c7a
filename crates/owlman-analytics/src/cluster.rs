//! 상관행렬 기반 계층적 군집화 (병합형).
//!
//! 가장 가까운 두 군집을 반복해서 합치고, 합친 군집과 나머지 군집 사이의
//! 거리는 Lance–Williams 갱신식으로 계산합니다.
//!
//! - Ward: 상관행렬의 행(종목별 상관 프로파일)을 특징 벡터로 보고
//!   제곱 유클리드 거리를 사용
//! - 평균/완전/단일 연결: `1 - 상관계수` 거리
//!
//! 최소 거리가 같은 쌍이 여럿이면 인덱스가 가장 작은 쌍을 먼저 합칩니다.

use owlman_core::Linkage;
use serde::{Deserialize, Serialize};

use crate::correlation::CorrelationMatrix;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 종목별 군집 라벨.
///
/// 라벨은 0부터 시작하며 유니버스 순서에서 처음 등장한 순서대로 매깁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl ClusterAssignment {
    /// 라벨 목록으로 생성 (라벨은 0..n_clusters 범위여야 함).
    pub fn from_labels(labels: Vec<usize>) -> Self {
        let n_clusters = labels.iter().max().map_or(0, |m| m + 1);
        Self { labels, n_clusters }
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// i번째 종목의 라벨.
    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// 군집에 속한 종목 인덱스 (유니버스 순서).
    pub fn members(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// 군집별 종목 인덱스 목록.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters];
        for (i, &label) in self.labels.iter().enumerate() {
            groups[label].push(i);
        }
        groups
    }
}

/// 상관행렬을 `n_clusters`개 군집으로 나눕니다.
///
/// `n_clusters`가 종목 수보다 크면 종목마다 하나의 군집이 됩니다.
pub fn agglomerative_cluster(
    corr: &CorrelationMatrix,
    n_clusters: usize,
    linkage: Linkage,
) -> AnalyticsResult<ClusterAssignment> {
    if n_clusters == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "n_clusters must be at least 1".to_string(),
        ));
    }

    let n = corr.len();
    let target = n_clusters.min(n);

    let mut dist = initial_distances(&corr.matrix, linkage);
    let mut active = vec![true; n];
    let mut sizes = vec![1usize; n];
    // 각 종목이 현재 속한 군집의 대표 인덱스
    let mut root: Vec<usize> = (0..n).collect();
    let mut remaining = n;

    while remaining > target {
        let Some((a, b)) = closest_pair(&dist, &active) else {
            break;
        };

        let (na, nb) = (sizes[a] as f64, sizes[b] as f64);
        let d_ab = dist[a][b];
        for k in (0..n).filter(|&k| active[k] && k != a && k != b) {
            let nk = sizes[k] as f64;
            let (d_ak, d_bk) = (dist[a][k], dist[b][k]);
            let updated = match linkage {
                Linkage::Ward => {
                    ((na + nk) * d_ak + (nb + nk) * d_bk - nk * d_ab) / (na + nb + nk)
                }
                Linkage::Average => (na * d_ak + nb * d_bk) / (na + nb),
                Linkage::Complete => d_ak.max(d_bk),
                Linkage::Single => d_ak.min(d_bk),
            };
            dist[a][k] = updated;
            dist[k][a] = updated;
        }

        sizes[a] += sizes[b];
        active[b] = false;
        for r in root.iter_mut().filter(|r| **r == b) {
            *r = a;
        }
        remaining -= 1;
    }

    // 처음 등장한 순서대로 0부터 번호 매김
    let mut relabel: Vec<Option<usize>> = vec![None; n];
    let mut next = 0;
    let labels = root
        .iter()
        .map(|&r| {
            *relabel[r].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect();

    Ok(ClusterAssignment {
        labels,
        n_clusters: next,
    })
}

fn initial_distances(matrix: &[Vec<f64>], linkage: Linkage) -> Vec<Vec<f64>> {
    let n = matrix.len();
    let mut dist = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let d = match linkage {
                Linkage::Ward => matrix[i]
                    .iter()
                    .zip(&matrix[j])
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum(),
                _ => 1.0 - matrix[i][j],
            };
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }
    dist
}

fn closest_pair(dist: &[Vec<f64>], active: &[bool]) -> Option<(usize, usize)> {
    let n = dist.len();
    let mut best: Option<(usize, usize, f64)> = None;

    for i in (0..n).filter(|&i| active[i]) {
        for j in ((i + 1)..n).filter(|&j| active[j]) {
            let d = dist[i][j];
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((i, j, d));
            }
        }
    }
    best.map(|(i, j, _)| (i, j))
}
