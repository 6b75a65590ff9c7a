//! 국내 휴장일 조회.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::kis_client;

pub async fn run(account: Option<&str>, date: NaiveDate) -> Result<()> {
    let client = kis_client(account)?;
    let holiday = client
        .is_holiday(date)
        .await
        .with_context(|| format!("Failed to check holiday for {}", date))?;

    if holiday {
        println!("{} : 휴장일", date);
    } else {
        println!("{} : 개장일", date);
    }
    Ok(())
}
