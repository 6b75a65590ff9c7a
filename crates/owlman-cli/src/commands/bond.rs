//! 채권 매매 손익 / 예상 수익.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use owlman_analytics::table::{bond_trade_frame, prediction_frame};
use owlman_analytics::{BondAnalyzer, PredictParams};
use owlman_core::BondConfig;
use owlman_exchange::ShinhanBondProvider;
use std::path::Path;

use super::{emit, kis_client, today_kst};

fn analyzer(config: &BondConfig, tax: bool) -> Result<BondAnalyzer<ShinhanBondProvider>> {
    let provider = ShinhanBondProvider::with_base_url(&config.base_url)?;
    Ok(BondAnalyzer::new(provider).with_tax(tax || config.tax))
}

/// 기간 내 채권 매매 기록.
pub async fn trades(
    config: &BondConfig,
    account: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
    tax: bool,
    csv: Option<&Path>,
) -> Result<()> {
    anyhow::ensure!(from <= to, "Start date must be before end date");

    let client = kis_client(account)?;
    let (records, _) = analyzer(config, tax)?
        .trading_result(&client, from, to, today_kst())
        .await
        .context("Failed to build bond trading result")?;

    emit(&mut bond_trade_frame(&records)?, csv)?;
    Ok(())
}

/// 보유 채권 예상 매도 수익.
pub async fn predict(
    config: &BondConfig,
    account: Option<&str>,
    from: NaiveDate,
    to: NaiveDate,
    mut params: PredictParams,
    csv: Option<&Path>,
) -> Result<()> {
    anyhow::ensure!(from <= to, "Start date must be before end date");
    params.tax |= config.tax;

    let client = kis_client(account)?;
    let today = today_kst();
    let analyzer = analyzer(config, params.tax)?;
    let (records, infos) = analyzer
        .trading_result(&client, from, to, today)
        .await
        .context("Failed to build bond trading result")?;

    let predictions = analyzer.predict(&records, &infos, &params, today)?;
    emit(&mut prediction_frame(&predictions)?, csv)?;
    Ok(())
}
