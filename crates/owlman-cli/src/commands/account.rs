//! 계좌 자산 현황 / 보유 종목 조회.

use anyhow::{Context, Result};
use owlman_analytics::investable_budget;
use owlman_analytics::table::{balance_frame, holdings_frame};
use rust_decimal::Decimal;

use super::{emit, kis_client};

pub async fn run(account: Option<&str>) -> Result<()> {
    let client = kis_client(account)?;

    let balance = client
        .get_account_balance()
        .await
        .context("Failed to load account balance")?;
    let weighted: Vec<_> = balance
        .into_iter()
        .filter(|r| r.total_weight_rate > Decimal::ZERO)
        .collect();
    emit(&mut balance_frame(&weighted)?, None)?;
    println!("투자 예산 : {}", investable_budget(&weighted));

    let holdings = client
        .get_stock_balance()
        .await
        .context("Failed to load holdings")?;
    emit(&mut holdings_frame(&holdings)?, None)?;
    Ok(())
}
