//! CLI 명령어 구현 모듈.

pub mod account;
pub mod bond;
pub mod etfs;
pub mod holiday;
pub mod screen;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use owlman_exchange::{KisAccountType, KisConfig, KisKrClient, KisOAuth};
use polars::prelude::DataFrame;
use std::path::Path;

/// "YYYYMMDD" 또는 "YYYY-MM-DD" 날짜 파싱.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    NaiveDate::parse_from_str(&digits, "%Y%m%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYYMMDD", s))
}

/// 한국 시간 기준 오늘.
pub fn today_kst() -> NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}

/// 환경 변수 설정으로 KIS 국내 클라이언트를 만듭니다.
///
/// `account`가 없으면 `KIS_DEFAULT_ACCOUNT` 계좌를 사용합니다.
pub fn kis_client(account: Option<&str>) -> Result<KisKrClient> {
    let config = match account {
        Some(name) => {
            let account_type = KisAccountType::parse(name)
                .with_context(|| format!("Unknown account type: {}", name))?;
            KisConfig::from_env_for_account(account_type)
        }
        None => KisConfig::from_env(),
    }
    .context("KIS credentials not found. Set KIS_{ACCOUNT}_APP_KEY/APP_SECRET/ACCOUNT_NUMBER")?;

    tracing::info!(
        account = config.account_type.display_name(),
        "KIS client configured"
    );
    let oauth = KisOAuth::new(config)?;
    Ok(KisKrClient::new(oauth)?)
}

/// 표를 출력하고, 경로가 있으면 CSV로도 저장합니다.
pub fn emit(df: &mut DataFrame, csv: Option<&Path>) -> Result<()> {
    println!("{}", df);
    if let Some(path) = csv {
        owlman_analytics::table::write_csv(df, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("저장 위치: {}", path.display());
    }
    Ok(())
}
