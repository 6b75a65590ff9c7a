//! ETF 유니버스 스크리닝.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owlman_analytics::table::{cluster_frame, screen_frame};
use owlman_analytics::{HelperParams, TradingHelper};
use owlman_core::{AppConfig, Instrument, Universe};
use owlman_exchange::provider::etf_universe;
use owlman_exchange::{EtfCategory, EtfItem, NaverEtfProvider};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::{emit, kis_client};

/// 스크리닝 명령 설정.
#[derive(Debug, Default)]
pub struct ScreenArgs {
    /// 직접 지정한 종목 코드 (비어 있으면 ETF 목록 사용)
    pub codes: Vec<String>,
    /// 시가총액 상위 N개만 사용
    pub top: Option<usize>,
    /// 최소 시가총액 (억원)
    pub min_market_cap: Option<Decimal>,
    /// ETF 분류 필터
    pub category: Option<String>,
    pub clusters: Option<usize>,
    pub screen: Option<usize>,
    pub limit: Option<f64>,
    pub buffer: Option<usize>,
    /// 진입 테이블 CSV 경로
    pub csv: Option<PathBuf>,
    /// 군집 구성표 CSV 경로
    pub groups_csv: Option<PathBuf>,
    /// 산점도 JSON 경로
    pub scatter: Option<PathBuf>,
}

impl ScreenArgs {
    /// 명령줄 값으로 설정을 덮어씁니다.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(n) = self.clusters {
            config.screen.n_clusters = n;
        }
        if let Some(n) = self.screen {
            config.screen.screen = n;
        }
        if let Some(limit) = self.limit {
            config.screen.limit = limit;
        }
        if let Some(buffer) = self.buffer {
            config.screen.buffer = buffer;
        }
    }
}

/// ETF 목록에서 필터를 적용해 유니버스를 만듭니다.
pub fn select_universe(items: &[EtfItem], args: &ScreenArgs) -> Result<Universe> {
    let category = args
        .category
        .as_deref()
        .map(|label| {
            EtfCategory::from_label(label).with_context(|| format!("Unknown category: {}", label))
        })
        .transpose()?;

    if !args.codes.is_empty() {
        let universe = args
            .codes
            .iter()
            .map(|code| match items.iter().find(|i| &i.code == code) {
                Some(item) => item.to_instrument(),
                None => Instrument::new(code, code),
            })
            .collect();
        return Ok(universe);
    }

    let mut selected: Vec<&EtfItem> = items
        .iter()
        .filter(|i| category.map_or(true, |c| i.category() == Some(c)))
        .filter(|i| args.min_market_cap.map_or(true, |m| i.market_cap >= m))
        .collect();
    selected.sort_by(|a, b| b.market_cap.cmp(&a.market_cap));
    if let Some(top) = args.top {
        selected.truncate(top);
    }

    Ok(etf_universe(selected))
}

/// 스크리닝 실행.
pub async fn run(mut config: AppConfig, account: Option<&str>, args: ScreenArgs) -> Result<()> {
    args.apply(&mut config);

    let items = NaverEtfProvider::new()?
        .fetch_etf_list()
        .await
        .context("Failed to load ETF list")?;
    let universe = select_universe(&items, &args)?;
    anyhow::ensure!(!universe.is_empty(), "Universe is empty");
    info!(universe = universe.len(), "Universe selected");

    let client = kis_client(account)?;
    let params = HelperParams::from_config(&config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!(
        "Screening {} instruments (pool {})...",
        universe.len(),
        params.concurrency
    ));

    let result = TradingHelper::build(&client, universe, &params).await;
    pb.finish_and_clear();
    let helper = result.context("Screening failed")?;

    let stats = helper.stats();
    println!(
        "UNIVERSE : {} (제외 {}), 시세 수집 {:.2}s",
        helper.universe().len(),
        stats.dropped(),
        stats.elapsed.as_secs_f64()
    );
    println!("투자 예산 : {}", helper.budget());

    let mut groups = cluster_frame(&helper.cluster_table())?;
    emit(&mut groups, args.groups_csv.as_deref())?;

    let mut table = screen_frame(helper.screen_table())?;
    emit(&mut table, args.csv.as_deref())?;
    println!("진입 합계 : {}", helper.total_entry());

    if let Some(path) = &args.scatter {
        let json = serde_json::to_string_pretty(&helper.scatter())?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("산점도 저장 위치: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(code: &str, tab: u8, cap: Decimal) -> EtfItem {
        serde_json::from_value(serde_json::json!({
            "itemcode": code, "etfTabCode": tab, "itemname": format!("{} ETF", code),
            "nowVal": 10000, "risefall": "3", "changeVal": 0, "changeRate": 0,
            "nav": null, "threeMonthEarnRate": null, "quant": 0, "amonut": 0,
            "marketSum": cap
        }))
        .unwrap()
    }

    fn items() -> Vec<EtfItem> {
        vec![
            item("A", 1, dec!(500)),
            item("B", 6, dec!(3000)),
            item("C", 1, dec!(1500)),
            item("D", 4, dec!(50)),
        ]
    }

    #[test]
    fn test_top_by_market_cap() {
        let args = ScreenArgs {
            top: Some(2),
            ..Default::default()
        };
        let universe = select_universe(&items(), &args).unwrap();
        assert_eq!(universe.codes(), vec!["B", "C"]);
    }

    #[test]
    fn test_category_and_min_cap() {
        let args = ScreenArgs {
            category: Some("국내 시장지수".into()),
            min_market_cap: Some(dec!(1000)),
            ..Default::default()
        };
        let universe = select_universe(&items(), &args).unwrap();
        assert_eq!(universe.codes(), vec!["C"]);

        let bad = ScreenArgs {
            category: Some("없는분류".into()),
            ..Default::default()
        };
        assert!(select_universe(&items(), &bad).is_err());
    }

    #[test]
    fn test_explicit_codes_keep_order() {
        let args = ScreenArgs {
            codes: vec!["D".into(), "Z".into(), "A".into()],
            ..Default::default()
        };
        let universe = select_universe(&items(), &args).unwrap();
        assert_eq!(universe.codes(), vec!["D", "Z", "A"]);
        assert_eq!(universe.get("Z").unwrap().name, "Z");
        assert_eq!(universe.get("D").unwrap().category.as_deref(), Some("해외 주식"));
    }

    #[test]
    fn test_overrides_applied() {
        let mut config = AppConfig::default();
        let args = ScreenArgs {
            clusters: Some(5),
            limit: Some(0.02),
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.screen.n_clusters, 5);
        assert_eq!(config.screen.limit, 0.02);
        assert_eq!(config.screen.screen, 4);
    }
}
