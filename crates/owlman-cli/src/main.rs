//! owlman CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 시가총액 상위 100개 ETF 스크리닝
//! owlman screen --top 100 --csv screen.csv --scatter scatter.json
//!
//! # 채권 ETF 목록
//! owlman etfs --category 채권
//!
//! # 휴장일 확인
//! owlman holiday --date 20240301
//!
//! # 채권 매매 손익과 만기 보유 시 예상 수익
//! owlman bond-trades --from 20240101 --to 20241231 --tax
//! owlman bond-predict --from 20240101 --to 20241231 --hold
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owlman_analytics::PredictParams;
use owlman_cli::commands::{self, parse_date, screen::ScreenArgs, today_kst};
use owlman_core::{init_logging, AppConfig, LogConfig};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "owlman")]
#[command(about = "owlman - ETF 모멘텀 스크리닝과 채권 손익 분석 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (기본: config/owlman.toml, 없으면 기본값)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// KIS 계좌 (paper, real_general, real_isa; 기본: KIS_DEFAULT_ACCOUNT)
    #[arg(short, long, global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// ETF 유니버스 스크리닝 (군집별 후보와 진입 금액)
    Screen {
        /// 종목 코드 직접 지정 (쉼표 구분)
        #[arg(long, value_delimiter = ',')]
        codes: Vec<String>,

        /// 시가총액 상위 N개
        #[arg(long)]
        top: Option<usize>,

        /// 최소 시가총액 (억원)
        #[arg(long)]
        min_market_cap: Option<Decimal>,

        /// ETF 분류 (예: "국내 시장지수", 채권)
        #[arg(long)]
        category: Option<String>,

        /// 군집 수
        #[arg(long)]
        clusters: Option<usize>,

        /// 채울 슬롯 수
        #[arg(long)]
        screen: Option<usize>,

        /// 종목당 허용 변동성 (예: 0.015)
        #[arg(long)]
        limit: Option<f64>,

        /// 버퍼 순위 수
        #[arg(long)]
        buffer: Option<usize>,

        /// 진입 테이블 CSV 저장 경로
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 군집 구성표 CSV 저장 경로
        #[arg(long)]
        groups_csv: Option<PathBuf>,

        /// 상관계수 산점도 JSON 저장 경로
        #[arg(long)]
        scatter: Option<PathBuf>,
    },

    /// 네이버 금융 ETF 목록
    Etfs {
        /// ETF 분류 필터
        #[arg(long)]
        category: Option<String>,

        /// CSV 저장 경로
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// 계좌 자산 현황과 보유 종목
    Account,

    /// 휴장일 확인
    Holiday {
        /// 날짜 (YYYYMMDD, 기본: 오늘)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// 채권 매매 손익
    BondTrades {
        /// 시작 날짜 (YYYYMMDD)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (YYYYMMDD)
        #[arg(short, long)]
        to: String,

        /// 이자소득세 적용
        #[arg(long)]
        tax: bool,

        /// CSV 저장 경로
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// 보유 채권 예상 매도 수익
    BondPredict {
        /// 시작 날짜 (YYYYMMDD)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (YYYYMMDD)
        #[arg(short, long)]
        to: String,

        /// 상품명 필터
        #[arg(long)]
        name: Option<String>,

        /// 매도 가격 (액면 10,000원 기준, 기본: 현재가)
        #[arg(long)]
        price: Option<Decimal>,

        /// 이 수익률(%)을 넘는 종목만 표시
        #[arg(long, default_value = "0")]
        min_yield: Decimal,

        /// 매도일 (YYYYMMDD, 기본: 오늘)
        #[arg(long)]
        sell_date: Option<String>,

        /// 만기 보유 가정
        #[arg(long)]
        hold: bool,

        /// 이자소득세 적용
        #[arg(long)]
        tax: bool,

        /// CSV 저장 경로
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(Some(path)),
        None => AppConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let account = cli.account.as_deref();

    let result = match cli.command {
        Commands::Screen {
            codes,
            top,
            min_market_cap,
            category,
            clusters,
            screen,
            limit,
            buffer,
            csv,
            groups_csv,
            scatter,
        } => {
            let args = ScreenArgs {
                codes,
                top,
                min_market_cap,
                category,
                clusters,
                screen,
                limit,
                buffer,
                csv,
                groups_csv,
                scatter,
            };
            commands::screen::run(config, account, args).await
        }

        Commands::Etfs { category, csv } => {
            commands::etfs::run(category.as_deref(), csv.as_deref()).await
        }

        Commands::Account => commands::account::run(account).await,

        Commands::Holiday { date } => {
            let date = match date {
                Some(d) => parse_date(&d)?,
                None => today_kst(),
            };
            commands::holiday::run(account, date).await
        }

        Commands::BondTrades { from, to, tax, csv } => {
            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            commands::bond::trades(&config.bond, account, from, to, tax, csv.as_deref()).await
        }

        Commands::BondPredict {
            from,
            to,
            name,
            price,
            min_yield,
            sell_date,
            hold,
            tax,
            csv,
        } => {
            let params = PredictParams {
                name,
                price,
                min_yield,
                sell_date: sell_date.as_deref().map(parse_date).transpose()?,
                hold,
                tax,
            };
            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            commands::bond::predict(&config.bond, account, from, to, params, csv.as_deref()).await
        }
    };

    match &result {
        Ok(()) => info!("Done"),
        Err(e) => error!(error = %e, "Command failed"),
    }
    result
}
