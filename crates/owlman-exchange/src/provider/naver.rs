//! 네이버 금융 ETF 목록 제공자.
//!
//! `GET /api/sise/etfItemList.nhn` 응답의 `result.etfItemList`를 읽어
//! 국내 상장 ETF 전체의 시세 요약을 제공합니다.

use crate::ExchangeError;
use owlman_core::{Instrument, Universe};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// 기본 ETF 목록 URL.
pub const ETF_LIST_URL: &str = "https://finance.naver.com/api/sise/etfItemList.nhn";

/// ETF 분류 (etfTabCode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EtfCategory {
    /// 국내 시장지수
    DomesticIndex,
    /// 국내 업종/테마
    DomesticSector,
    /// 국내 파생
    DomesticDerivative,
    /// 해외 주식
    OverseasEquity,
    /// 원자재
    Commodity,
    /// 채권
    Bond,
    /// 기타
    Other,
}

impl EtfCategory {
    /// 탭 코드(1..=7)에서 변환.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::DomesticIndex),
            2 => Some(Self::DomesticSector),
            3 => Some(Self::DomesticDerivative),
            4 => Some(Self::OverseasEquity),
            5 => Some(Self::Commodity),
            6 => Some(Self::Bond),
            7 => Some(Self::Other),
            _ => None,
        }
    }

    /// 한글 표시 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DomesticIndex => "국내 시장지수",
            Self::DomesticSector => "국내 업종/테마",
            Self::DomesticDerivative => "국내 파생",
            Self::OverseasEquity => "해외 주식",
            Self::Commodity => "원자재",
            Self::Bond => "채권",
            Self::Other => "기타",
        }
    }

    /// 한글 이름에서 파싱.
    pub fn from_label(label: &str) -> Option<Self> {
        (1..=7)
            .filter_map(Self::from_code)
            .find(|c| c.label() == label.trim())
    }
}

impl std::fmt::Display for EtfCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// ETF 한 종목의 시세 요약.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EtfItem {
    /// 종목코드
    #[serde(rename = "itemcode")]
    pub code: String,
    /// 분류 탭 코드
    #[serde(rename = "etfTabCode")]
    pub tab_code: u8,
    /// 종목명
    #[serde(rename = "itemname")]
    pub name: String,
    /// 현재가
    #[serde(rename = "nowVal")]
    pub price: Decimal,
    /// 등락 구분 ("2" 상승, "5" 하락)
    #[serde(rename = "risefall")]
    pub rise_fall: String,
    /// 전일비
    #[serde(rename = "changeVal")]
    pub change: Decimal,
    /// 등락률 (%)
    #[serde(rename = "changeRate")]
    pub change_rate: Decimal,
    /// NAV
    #[serde(default)]
    pub nav: Option<Decimal>,
    /// 3개월 수익률 (%)
    #[serde(rename = "threeMonthEarnRate", default)]
    pub three_month_return: Option<Decimal>,
    /// 거래량
    #[serde(rename = "quant")]
    pub volume: Decimal,
    /// 거래대금 (백만원)
    #[serde(rename = "amonut")]
    pub trading_value: Decimal,
    /// 시가총액 (억원)
    #[serde(rename = "marketSum")]
    pub market_cap: Decimal,
}

impl EtfItem {
    /// 분류.
    pub fn category(&self) -> Option<EtfCategory> {
        EtfCategory::from_code(self.tab_code)
    }

    /// 등락 기호 (▲/▼, 보합은 빈 문자열).
    pub fn rise_fall_symbol(&self) -> &'static str {
        match self.rise_fall.as_str() {
            "2" => "▲",
            "5" => "▼",
            _ => "",
        }
    }

    /// 유니버스 종목으로 변환.
    pub fn to_instrument(&self) -> Instrument {
        let instrument =
            Instrument::new(&self.code, &self.name).with_market_cap(self.market_cap);
        match self.category() {
            Some(category) => instrument.with_category(category.label()),
            None => instrument,
        }
    }
}

/// ETF 목록으로 유니버스를 만듭니다 (목록 순서 유지).
pub fn etf_universe<'a>(items: impl IntoIterator<Item = &'a EtfItem>) -> Universe {
    items.into_iter().map(EtfItem::to_instrument).collect()
}

#[derive(Debug, Deserialize)]
struct EtfListResponse {
    result: EtfListResult,
}

#[derive(Debug, Deserialize)]
struct EtfListResult {
    #[serde(rename = "etfItemList", default)]
    etf_item_list: Vec<EtfItem>,
}

/// 네이버 금융 ETF 목록 제공자.
pub struct NaverEtfProvider {
    client: Client,
    url: String,
}

impl NaverEtfProvider {
    /// 기본 URL로 생성.
    pub fn new() -> Result<Self, ExchangeError> {
        Self::with_url(ETF_LIST_URL)
    }

    /// URL을 지정해 생성 (테스트용 목 서버 등).
    pub fn with_url(url: impl Into<String>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// 전체 ETF 목록을 가져옵니다.
    pub async fn fetch_etf_list(&self) -> Result<Vec<EtfItem>, ExchangeError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        // 응답이 EUC-KR 헤더를 달고 올 때가 있어 바이트를 직접 UTF-8로 읽습니다
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes);

        if !status.is_success() {
            error!(%status, "ETF list request failed");
            return Err(ExchangeError::http(status, body.into_owned()));
        }

        let resp: EtfListResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("Failed to parse ETF list: {}", e)))?;

        debug!(count = resp.result.etf_item_list.len(), "ETF list loaded");
        Ok(resp.result.etf_item_list)
    }
}
