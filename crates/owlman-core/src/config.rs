//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → `OWLMAN__SECTION__KEY` 환경 변수 순서로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::OwlResult;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 스크리닝 설정
    pub screen: ScreenConfig,
    /// 시세 수집 설정
    pub fetch: FetchConfig,
    /// 채권 설정
    pub bond: BondConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 계층적 군집화 연결 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// 상관계수 행을 특징 벡터로 보는 Ward 연결
    #[default]
    Ward,
    /// 평균 연결 (1 - 상관계수 거리)
    Average,
    /// 완전 연결 (1 - 상관계수 거리)
    Complete,
    /// 단일 연결 (1 - 상관계수 거리)
    Single,
}

impl std::str::FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ward" => Ok(Self::Ward),
            "average" => Ok(Self::Average),
            "complete" => Ok(Self::Complete),
            "single" => Ok(Self::Single),
            _ => Err(format!("Unknown linkage: {}", s)),
        }
    }
}

/// 지수 가중 평균의 평활 계수 지정 방식.
///
/// 둘 다 가장 긴 모멘텀 기간을 파라미터로 사용합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// alpha = 2 / (span + 1)
    #[default]
    Span,
    /// alpha = 1 / (com + 1)
    CenterOfMass,
}

impl Smoothing {
    /// 기간 파라미터로부터 alpha를 계산합니다.
    pub fn alpha(&self, window: usize) -> f64 {
        let w = window as f64;
        match self {
            Smoothing::Span => 2.0 / (w + 1.0),
            Smoothing::CenterOfMass => 1.0 / (w + 1.0),
        }
    }
}

impl std::str::FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "span" => Ok(Self::Span),
            "com" | "center_of_mass" => Ok(Self::CenterOfMass),
            _ => Err(format!("Unknown smoothing: {}", s)),
        }
    }
}

/// 스크리닝 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// 모멘텀 기간 (거래일)
    pub periods: Vec<usize>,
    /// 군집 수
    pub n_clusters: usize,
    /// 채울 슬롯 수
    pub screen: usize,
    /// 종목당 허용 변동성 (가격 대비 비율)
    pub limit: f64,
    /// 버퍼 순위 수
    pub buffer: usize,
    /// 진입 금액 절사 단위 (원)
    pub budget_unit: u64,
    /// 군집화 연결 방식
    pub linkage: Linkage,
    /// ATR 평활 방식
    pub smoothing: Smoothing,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            periods: vec![2, 3, 5, 8, 13, 21],
            n_clusters: 10,
            screen: 4,
            limit: 0.015,
            buffer: 1,
            budget_unit: 100_000,
            linkage: Linkage::Ward,
            smoothing: Smoothing::Span,
        }
    }
}

impl ScreenConfig {
    /// 가장 긴 모멘텀 기간 (상관계수/ATR 조회 기간).
    pub fn lookback(&self) -> usize {
        self.periods.iter().copied().max().unwrap_or(21)
    }
}

/// 시세 수집 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// 동시 요청 수 = 가용 병렬성 × 이 값
    pub concurrency_multiplier: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency_multiplier: 2,
        }
    }
}

impl FetchConfig {
    /// 실제 동시 요청 한도를 계산합니다.
    pub fn concurrency(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        (cores * self.concurrency_multiplier).max(1)
    }
}

/// 채권 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BondConfig {
    /// 채권 정보 API 기본 URL
    pub base_url: String,
    /// 이자소득세 적용 여부
    pub tax: bool,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.shinhansec.com/siw/wealth-management/bond-rp".to_string(),
            tax: false,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 설정 파일(있으면)과 환경 변수에서 설정을 로드합니다.
    ///
    /// `.env` 파일이 있으면 먼저 읽어 환경 변수에 반영합니다.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> OwlResult<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("OWLMAN")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("screen.periods")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로(`config/owlman.toml`)에서 설정을 로드합니다.
    pub fn load_default() -> OwlResult<Self> {
        Self::load(Some("config/owlman.toml"))
    }

    fn validate(&self) -> OwlResult<()> {
        use crate::error::OwlError;

        if self.screen.periods.is_empty() || self.screen.periods.contains(&0) {
            return Err(OwlError::Config(
                "screen.periods must contain positive windows".to_string(),
            ));
        }
        if self.screen.budget_unit == 0 {
            return Err(OwlError::Config("screen.budget_unit must be positive".to_string()));
        }
        Ok(())
    }
}
