//! 스크리닝 전체 흐름.
//!
//! 계좌 조회 → 시세 수집 → 예산 → 변동성/상관계수 → 군집화 → 진입 테이블.

use futures::stream::{self, StreamExt};
use owlman_core::{AppConfig, PriceHistory, ScreenConfig, Universe};
use owlman_exchange::{AccountDataSource, AssetBalanceRow, KrHolding, MarketDataSource};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{error, info};

use crate::cluster::{agglomerative_cluster, ClusterAssignment};
use crate::correlation::{correlation_matrix, CorrelationMatrix, TrueRangeFrame};
use crate::error::AnalyticsResult;
use crate::indicators::{momentum_score, risk_estimate};
use crate::pca::{correlation_scatter, ScatterPoint};
use crate::screening::{build_screen_table, ScreenParams, ScreenRow};
use crate::stats::FetchStats;

/// 스크리닝 실행 파라미터.
#[derive(Debug, Clone)]
pub struct HelperParams {
    pub screen: ScreenConfig,
    /// 시세 동시 요청 한도
    pub concurrency: usize,
}

impl HelperParams {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            screen: config.screen.clone(),
            concurrency: config.fetch.concurrency(),
        }
    }
}

impl Default for HelperParams {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 투자 예산: 채권과 합계 행을 제외한 자산의 평가금액 합.
pub fn investable_budget(rows: &[AssetBalanceRow]) -> Decimal {
    rows.iter()
        .filter(|r| r.total_weight_rate > Decimal::ZERO && !r.is_bond() && !r.is_total())
        .map(|r| r.eval_amount)
        .sum()
}

/// 한 번의 스크리닝 결과.
#[derive(Debug, Clone)]
pub struct TradingHelper {
    universe: Universe,
    holdings: Vec<KrHolding>,
    histories: Vec<PriceHistory>,
    balance: Vec<AssetBalanceRow>,
    budget: Decimal,
    true_ranges: TrueRangeFrame,
    correlation: CorrelationMatrix,
    clusters: ClusterAssignment,
    screen_table: Vec<ScreenRow>,
    stats: FetchStats,
}

impl TradingHelper {
    /// 스크리닝 전체를 실행합니다.
    ///
    /// 시세 조회에 실패했거나 일봉이 없는 종목은 로그를 남기고 유니버스에서 뺍니다.
    pub async fn build<S>(
        source: &S,
        mut universe: Universe,
        params: &HelperParams,
    ) -> AnalyticsResult<Self>
    where
        S: MarketDataSource + AccountDataSource,
    {
        info!(universe = universe.len(), "Screening started");

        // 1. 보유 종목
        let holdings = source.stock_holdings().await?;

        // 2. 시세 수집
        let (mut by_code, stats) = fetch_histories(source, &universe, params.concurrency).await;
        universe.retain(|i| by_code.contains_key(&i.code));
        let histories: Vec<PriceHistory> = universe
            .iter()
            .filter_map(|i| by_code.remove(&i.code))
            .collect();

        // 3. 자산 현황 (비중 > 0)
        let balance: Vec<AssetBalanceRow> = source
            .asset_balance()
            .await?
            .into_iter()
            .filter(|r| r.total_weight_rate > Decimal::ZERO)
            .collect();

        // 4. 예산
        let budget = investable_budget(&balance);

        // 5. 변동성 / 상관계수
        let config = &params.screen;
        let lookback = config.lookback();
        let true_ranges = TrueRangeFrame::from_histories(&histories, lookback);
        let correlation = correlation_matrix(&true_ranges);

        // 6. 군집화
        let clusters = agglomerative_cluster(&correlation, config.n_clusters, config.linkage)?;

        // 7. 진입 테이블
        let alpha = config.smoothing.alpha(lookback);
        let scores: Vec<f64> = histories
            .iter()
            .map(|h| momentum_score(&h.closes_f64(), &config.periods))
            .collect();
        let risks = histories
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let close = h.last_close().and_then(|c| c.to_f64());
                risk_estimate(true_ranges.column(i), close, alpha)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let held: HashSet<String> = holdings.iter().map(|h| h.stock_code.clone()).collect();
        let screen_params = ScreenParams::from_config(config, budget);
        let screen_table =
            build_screen_table(&universe, &scores, &risks, &clusters, &held, &screen_params)?;

        let total_entry: u64 = screen_table.iter().map(|r| r.entry).sum();
        info!(
            universe = universe.len(),
            clusters = clusters.n_clusters(),
            %budget,
            total_entry,
            "Screening finished"
        );

        Ok(Self {
            universe,
            holdings,
            histories,
            balance,
            budget,
            true_ranges,
            correlation,
            clusters,
            screen_table,
            stats,
        })
    }

    /// 시세를 받은 종목만 남은 유니버스.
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn holdings(&self) -> &[KrHolding] {
        &self.holdings
    }

    pub fn histories(&self) -> &[PriceHistory] {
        &self.histories
    }

    /// 비중이 있는 자산 현황.
    pub fn balance(&self) -> &[AssetBalanceRow] {
        &self.balance
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    pub fn true_ranges(&self) -> &TrueRangeFrame {
        &self.true_ranges
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    pub fn clusters(&self) -> &ClusterAssignment {
        &self.clusters
    }

    pub fn screen_table(&self) -> &[ScreenRow] {
        &self.screen_table
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// 진입 금액 합계.
    pub fn total_entry(&self) -> u64 {
        self.screen_table.iter().map(|r| r.entry).sum()
    }

    /// (그룹 번호(1부터), 종목코드, 종목명) 목록, 그룹 순서.
    pub fn cluster_table(&self) -> Vec<(usize, String, String)> {
        let instruments: Vec<_> = self.universe.iter().collect();
        self.clusters
            .groups()
            .into_iter()
            .enumerate()
            .flat_map(|(group, members)| {
                members.into_iter().map(move |i| (group, i))
            })
            .map(|(group, i)| {
                (
                    group + 1,
                    instruments[i].code.clone(),
                    instruments[i].name.clone(),
                )
            })
            .collect()
    }

    /// 상관계수 2차원 산점도.
    pub fn scatter(&self) -> Vec<ScatterPoint> {
        correlation_scatter(&self.correlation, &self.universe)
    }
}

/// 유니버스 전체 일봉을 동시 요청 한도 안에서 수집합니다.
async fn fetch_histories<S>(
    source: &S,
    universe: &Universe,
    concurrency: usize,
) -> (HashMap<String, PriceHistory>, FetchStats)
where
    S: MarketDataSource + ?Sized,
{
    let concurrency = concurrency.max(1);
    let mut stats = FetchStats::new(universe.len(), concurrency);
    let started = Instant::now();

    let results: Vec<_> = stream::iter(universe.codes())
        .map(|code| async move {
            let result = source.daily_history(&code).await;
            (code, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut histories = HashMap::with_capacity(results.len());
    for (code, result) in results {
        match result {
            Ok(history) if history.is_empty() => {
                stats.empty += 1;
                error!(code = %code, "No daily bars, dropped from universe");
            }
            Ok(history) => {
                stats.success += 1;
                histories.insert(code, history);
            }
            Err(e) => {
                stats.errors += 1;
                error!(code = %code, error = %e, "Daily price fetch failed, dropped from universe");
            }
        }
    }

    stats.elapsed = started.elapsed();
    stats.log_summary("daily_price");
    (histories, stats)
}
