//! 시세 수집 통계.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 종목별 시세 수집 통계.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchStats {
    /// 총 요청 수
    pub total: usize,
    /// 성공 (일봉 1개 이상)
    pub success: usize,
    /// 실패 (요청/파싱 에러)
    pub errors: usize,
    /// 빈 데이터 (조회 성공, 일봉 없음)
    pub empty: usize,
    /// 동시 요청 한도
    pub concurrency: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl FetchStats {
    pub fn new(total: usize, concurrency: usize) -> Self {
        Self {
            total,
            concurrency,
            ..Default::default()
        }
    }

    /// 성공률 (%).
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 제외된 종목 수 (실패 + 빈 데이터).
    pub fn dropped(&self) -> usize {
        self.errors + self.empty
    }

    /// 통계 요약 로그 출력.
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            empty = self.empty,
            concurrency = self.concurrency,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.2}s", self.elapsed.as_secs_f64()),
            "시세 수집 완료"
        );
    }
}
