//! 네이버 금융 ETF 목록 조회.

use anyhow::{Context, Result};
use owlman_analytics::table::etf_frame;
use owlman_exchange::{EtfCategory, NaverEtfProvider};
use std::path::Path;

use super::emit;

/// ETF 목록 출력 (분류 필터 선택).
pub async fn run(category: Option<&str>, csv: Option<&Path>) -> Result<()> {
    let category = category
        .map(|label| {
            EtfCategory::from_label(label).with_context(|| format!("Unknown category: {}", label))
        })
        .transpose()?;

    let mut items = NaverEtfProvider::new()?
        .fetch_etf_list()
        .await
        .context("Failed to load ETF list")?;
    if let Some(category) = category {
        items.retain(|i| i.category() == Some(category));
    }

    let mut df = etf_frame(&items)?;
    emit(&mut df, csv)?;
    println!("ETF : {}", items.len());
    Ok(())
}
