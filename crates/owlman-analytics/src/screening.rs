//! 군집별 후보 선정과 진입 금액 산출.
//!
//! 1. 군집마다 모멘텀 점수가 가장 높은 종목을 후보로 뽑습니다.
//! 2. 후보를 점수 내림차순으로 정렬합니다.
//! 3. 버퍼 순위 안에 드는지, 군집 종목을 이미 보유 중인지 표시합니다.
//! 4. 위험도로 조정한 진입 금액을 계산하고 남은 슬롯에만 배분합니다.

use owlman_core::{ScreenConfig, Universe};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::cluster::ClusterAssignment;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 스크리닝 파라미터.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenParams {
    /// 채울 슬롯 수
    pub screen: usize,
    /// 종목당 허용 변동성 (가격 대비 비율)
    pub limit: f64,
    /// 버퍼 순위 수
    pub buffer: usize,
    /// 투자 예산 (원)
    pub budget: Decimal,
    /// 진입 금액 절사 단위 (원)
    pub budget_unit: u64,
}

impl ScreenParams {
    /// 설정값과 예산으로 생성.
    pub fn from_config(config: &ScreenConfig, budget: Decimal) -> Self {
        Self {
            screen: config.screen,
            limit: config.limit,
            buffer: config.buffer,
            budget,
            budget_unit: config.budget_unit,
        }
    }

    /// 위험도로 조정한 진입 금액.
    ///
    /// `min(limit / risk, 1) × budget / screen`을 절사 단위로 내림합니다.
    /// 위험도가 없거나 유한하지 않으면 0, 위험도가 0이면 조정 계수는 1입니다.
    pub fn entry_amount(&self, risk: Option<f64>) -> u64 {
        let Some(risk) = risk.filter(|r| r.is_finite()) else {
            return 0;
        };
        if self.screen == 0 || self.budget_unit == 0 {
            return 0;
        }

        let factor = if risk == 0.0 {
            1.0
        } else {
            (self.limit / risk).min(1.0)
        };
        let per_slot = self.budget.to_f64().unwrap_or(0.0) / self.screen as f64;
        let raw = factor * per_slot;
        if !raw.is_finite() || raw <= 0.0 {
            return 0;
        }

        let unit = self.budget_unit as f64;
        (raw / unit).floor() as u64 * self.budget_unit
    }
}

/// 군집 대표 후보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 군집 라벨 (0부터)
    pub group: usize,
    pub code: String,
    pub name: String,
    /// 모멘텀 점수
    pub score: f64,
    /// 위험도 (가격 대비 ATR)
    pub risk: Option<f64>,
}

/// 진입 테이블의 한 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRow {
    /// 군집 라벨 (0부터)
    pub group: usize,
    pub code: String,
    pub name: String,
    pub score: f64,
    pub risk: Option<f64>,
    /// 군집 종목 보유 여부
    pub held: bool,
    /// 버퍼 순위 이내 여부
    pub buffered: bool,
    /// 진입 금액 (원)
    pub entry: u64,
}

impl ScreenRow {
    /// 표시용 그룹 번호 (1부터).
    pub fn group_number(&self) -> usize {
        self.group + 1
    }

    /// 소수 셋째 자리까지 버린 점수.
    pub fn score_display(&self) -> f64 {
        (self.score * 1000.0).trunc() / 1000.0
    }

    /// 백분율, 소수 둘째 자리까지 버린 위험도.
    pub fn risk_percent(&self) -> Option<f64> {
        self.risk
            .filter(|r| r.is_finite())
            .map(|r| (r * 10000.0).trunc() / 100.0)
    }

    /// 보유 표시.
    pub fn held_mark(&self) -> &'static str {
        if self.held {
            "✅"
        } else {
            "🔘"
        }
    }
}

/// 군집마다 점수가 가장 높은 종목을 뽑습니다 (동점이면 유니버스 순서상 앞선 종목).
pub fn select_candidates(
    universe: &Universe,
    scores: &[f64],
    risks: &[Option<f64>],
    clusters: &ClusterAssignment,
) -> AnalyticsResult<Vec<Candidate>> {
    let n = universe.len();
    if scores.len() != n || risks.len() != n || clusters.labels().len() != n {
        return Err(AnalyticsError::InvalidParameter(format!(
            "length mismatch: universe {}, scores {}, risks {}, labels {}",
            n,
            scores.len(),
            risks.len(),
            clusters.labels().len()
        )));
    }

    let instruments: Vec<_> = universe.iter().collect();
    let candidates = clusters
        .groups()
        .into_iter()
        .enumerate()
        .filter_map(|(group, members)| {
            let best = members.into_iter().reduce(|best, i| {
                if scores[i] > scores[best] {
                    i
                } else {
                    best
                }
            })?;
            Some(Candidate {
                group,
                code: instruments[best].code.clone(),
                name: instruments[best].name.clone(),
                score: scores[best],
                risk: risks[best],
            })
        })
        .collect();

    Ok(candidates)
}

/// 진입 테이블 작성.
///
/// # 인자
/// * `universe` - 유니버스 (scores/risks/clusters와 같은 순서)
/// * `scores` - 종목별 모멘텀 점수
/// * `risks` - 종목별 위험도
/// * `clusters` - 군집 라벨
/// * `held_codes` - 현재 보유 종목 코드
/// * `params` - 스크리닝 파라미터
pub fn build_screen_table(
    universe: &Universe,
    scores: &[f64],
    risks: &[Option<f64>],
    clusters: &ClusterAssignment,
    held_codes: &HashSet<String>,
    params: &ScreenParams,
) -> AnalyticsResult<Vec<ScreenRow>> {
    if params.screen == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "screen must be at least 1".to_string(),
        ));
    }

    let mut candidates = select_candidates(universe, scores, risks, clusters)?;
    // 안정 정렬: 동점은 군집 번호 순서 유지
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let n = candidates.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let codes: Vec<&str> = universe.iter().map(|i| i.code.as_str()).collect();
    let threshold = candidates[(params.screen + params.buffer).min(n) - 1].score;

    let mut rows: Vec<ScreenRow> = candidates
        .into_iter()
        .map(|c| {
            let held = clusters
                .members(c.group)
                .iter()
                .any(|&i| held_codes.contains(codes[i]));
            ScreenRow {
                buffered: c.score > 1.0 && c.score >= threshold,
                held,
                entry: params.entry_amount(c.risk),
                group: c.group,
                code: c.code,
                name: c.name,
                score: c.score,
                risk: c.risk,
            }
        })
        .collect();

    let held_buffered = rows.iter().filter(|r| r.buffered && r.held).count();
    let remaining = params.screen.saturating_sub(held_buffered);
    let own = rows.iter().filter(|r| r.held).count();
    let cutoff = own + remaining;
    let cutoff_score = rows.get(cutoff).map(|r| r.score);

    tracing::debug!(own, remaining, cutoff, "Screen slots");

    for row in rows.iter_mut() {
        let keep = if row.buffered && row.held {
            true
        } else {
            !row.held
                && remaining > 0
                && cutoff_score.map_or(true, |s| row.score > s)
        };
        if !keep {
            row.entry = 0;
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owlman_core::Instrument;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn universe(n: usize) -> Universe {
        (0..n)
            .map(|i| Instrument::new(format!("{:06}", i), format!("ETF {}", i)))
            .collect()
    }

    fn params(screen: usize, buffer: usize, budget: Decimal) -> ScreenParams {
        ScreenParams {
            screen,
            limit: 0.015,
            buffer,
            budget,
            budget_unit: 100_000,
        }
    }

    #[test]
    fn test_entry_amount() {
        let p = params(4, 1, dec!(10_000_000));
        // 2,500,000 × 0.015 / 0.03 = 1,250,000 → 1,200,000
        assert_eq!(p.entry_amount(Some(0.03)), 1_200_000);
        // 위험도가 한도 이하면 조정 없음
        assert_eq!(p.entry_amount(Some(0.01)), 2_500_000);
        assert_eq!(p.entry_amount(Some(0.0)), 2_500_000);
        assert_eq!(p.entry_amount(None), 0);
        assert_eq!(p.entry_amount(Some(f64::NAN)), 0);
        assert_eq!(p.entry_amount(Some(-0.02)), 0);
        assert_eq!(params(4, 1, dec!(-1_000_000)).entry_amount(Some(0.01)), 0);
    }

    #[test]
    fn test_three_instruments_single_slot() {
        let u = universe(3);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 2]);
        let rows = build_screen_table(
            &u,
            &[1.02, 1.05, 0.98],
            &[Some(0.01), Some(0.01), Some(0.01)],
            &clusters,
            &HashSet::new(),
            &params(1, 0, dec!(3_000_000)),
        )
        .unwrap();

        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["000001", "000000", "000002"]);
        assert_eq!(rows[0].entry, 3_000_000);
        assert!(rows[0].buffered);
        assert_eq!(rows[1].entry, 0);
        assert_eq!(rows[2].entry, 0);
    }

    #[test]
    fn test_candidate_per_cluster() {
        let u = universe(4);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 0, 1]);
        let candidates =
            select_candidates(&u, &[1.1, 1.2, 1.3, 1.2], &[None; 4], &clusters).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].code, "000002");
        // 동점은 앞선 종목
        assert_eq!(candidates[1].code, "000001");

        assert!(select_candidates(&u, &[1.0], &[None; 4], &clusters).is_err());
    }

    #[test]
    fn test_held_buffered_keeps_entry() {
        // 4개 군집, 2슬롯, 버퍼 1: 버퍼 임계는 3위 점수
        let u = universe(4);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 2, 3]);
        let held: HashSet<String> = ["000002".to_string()].into_iter().collect();
        let rows = build_screen_table(
            &u,
            &[1.30, 1.20, 1.10, 1.05],
            &[Some(0.01); 4],
            &clusters,
            &held,
            &params(2, 1, dec!(2_000_000)),
        )
        .unwrap();

        let entries: Vec<u64> = rows.iter().map(|r| r.entry).collect();
        let held_flags: Vec<bool> = rows.iter().map(|r| r.held).collect();
        let buffered: Vec<bool> = rows.iter().map(|r| r.buffered).collect();
        assert_eq!(held_flags, vec![false, false, true, false]);
        assert_eq!(buffered, vec![true, true, true, false]);
        // held_buffered = 1, remaining = 1, own = 1, cutoff = 2 (점수 1.10)
        assert_eq!(entries, vec![1_000_000, 1_000_000, 1_000_000, 0]);
        assert_eq!(rows[2].held_mark(), "✅");
        assert_eq!(rows[0].held_mark(), "🔘");
    }

    #[test]
    fn test_held_outside_buffer_gets_zero() {
        let u = universe(3);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 2]);
        let held: HashSet<String> = ["000002".to_string()].into_iter().collect();
        let rows = build_screen_table(
            &u,
            &[1.3, 1.2, 0.9],
            &[Some(0.01); 3],
            &clusters,
            &held,
            &params(1, 0, dec!(1_000_000)),
        )
        .unwrap();

        assert_eq!(rows[2].code, "000002");
        assert!(rows[2].held);
        assert_eq!(rows[2].entry, 0);
        // own = 1, remaining = 1, cutoff = 2 (점수 0.9)
        assert_eq!(rows[0].entry, 1_000_000);
        assert_eq!(rows[1].entry, 1_000_000);
    }

    #[test]
    fn test_scores_below_one_still_fill_slots() {
        let u = universe(3);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 2]);
        let rows = build_screen_table(
            &u,
            &[0.99, 0.98, 0.97],
            &[Some(0.01); 3],
            &clusters,
            &HashSet::new(),
            &params(1, 0, dec!(1_000_000)),
        )
        .unwrap();

        let entries: Vec<(f64, u64)> = rows.iter().map(|r| (r.score, r.entry)).collect();
        assert_eq!(entries, vec![(0.99, 1_000_000), (0.98, 0), (0.97, 0)]);
        assert!(rows.iter().all(|r| !r.buffered));
    }

    #[test]
    fn test_buffer_threshold_clamped_to_candidates() {
        // screen + buffer = 5 > 후보 2개: 임계는 마지막 후보 점수
        let u = universe(2);
        let clusters = ClusterAssignment::from_labels(vec![0, 1]);
        let rows = build_screen_table(
            &u,
            &[1.1, 1.2],
            &[Some(0.01); 2],
            &clusters,
            &HashSet::new(),
            &params(4, 1, dec!(4_000_000)),
        )
        .unwrap();

        let result: Vec<(f64, bool, u64)> =
            rows.iter().map(|r| (r.score, r.buffered, r.entry)).collect();
        // cutoff = 4 ≥ 2: 넘어야 할 순위가 없으므로 모두 진입
        assert_eq!(result, vec![(1.2, true, 1_000_000), (1.1, true, 1_000_000)]);
    }

    #[test]
    fn test_cutoff_past_candidates_allocates_all_unheld() {
        let u = universe(3);
        let clusters = ClusterAssignment::from_labels(vec![0, 1, 2]);
        let held: HashSet<String> = ["000000".to_string()].into_iter().collect();
        let rows = build_screen_table(
            &u,
            &[0.9, 0.95, 0.8],
            &[Some(0.01); 3],
            &clusters,
            &held,
            &params(3, 0, dec!(3_000_000)),
        )
        .unwrap();

        // own = 1, remaining = 3, cutoff = 4 ≥ 3
        let entries: Vec<(&str, u64)> =
            rows.iter().map(|r| (r.code.as_str(), r.entry)).collect();
        assert_eq!(
            entries,
            vec![("000001", 1_000_000), ("000000", 0), ("000002", 1_000_000)]
        );
    }

    #[test]
    fn test_screen_zero_rejected() {
        let u = universe(1);
        let clusters = ClusterAssignment::from_labels(vec![0]);
        let result = build_screen_table(
            &u,
            &[1.0],
            &[None],
            &clusters,
            &HashSet::new(),
            &params(0, 0, dec!(1)),
        );
        assert!(matches!(result, Err(AnalyticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_display_truncation() {
        let row = ScreenRow {
            group: 0,
            code: "A".into(),
            name: "A".into(),
            score: 1.23456,
            risk: Some(0.012345),
            held: false,
            buffered: false,
            entry: 0,
        };
        assert_eq!(row.group_number(), 1);
        assert_eq!(row.score_display(), 1.234);
        assert_eq!(row.risk_percent(), Some(1.23));
    }

    proptest! {
        #[test]
        fn prop_entry_bounded_multiple_of_unit(
            budget in 0i64..10_000_000_000,
            screen in 1usize..10,
            risk in 0.0001f64..1.0
        ) {
            let p = params(screen, 1, Decimal::from(budget));
            let entry = p.entry_amount(Some(risk));
            prop_assert_eq!(entry % 100_000, 0);
            prop_assert!(entry as f64 <= budget as f64 / screen as f64 + 1e-6);
        }
    }
}
