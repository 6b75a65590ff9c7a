//! 신한투자증권 채권 정보 제공자.
//!
//! - 발행정보 (`590401P02`): 이자 지급 일정과 만기일
//! - 상세시세 (`590401P03V02`): 현재가 (만기 후에는 본문이 없어 상환가 1000으로 간주)
//!
//! 한 번 조회한 채권은 프로세스가 끝날 때까지 캐시합니다.

use crate::ExchangeError;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// 기본 API 경로.
pub const BOND_BASE_URL: &str = "https://www.shinhansec.com/siw/wealth-management/bond-rp";

/// 발행정보 화면 번호.
const ISSUE_INFO_SCREEN: &str = "590401P02";
/// 상세시세 화면 번호.
const PRICE_INFO_SCREEN: &str = "590401P03V02";

/// 만기 상환 가격.
pub const REDEMPTION_PRICE: Decimal = dec!(1000);

/// 이자 지급 일정 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponPayment {
    /// 지급일자
    pub date: NaiveDate,
    /// 지급이율 (%)
    pub rate: Decimal,
    /// 세전 지급금액 (액면 10,000원 기준)
    pub amount: Decimal,
}

/// 채권 발행/시세 정보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondInfo {
    /// 상품번호 (채권 코드)
    pub code: String,
    /// 이자 지급 일정
    pub coupons: Vec<CouponPayment>,
    /// 만기일
    pub maturity: NaiveDate,
    /// 현재가 (액면 10,000원 기준)
    pub current_price: Decimal,
}

#[derive(Serialize)]
struct BondRequest<'a> {
    #[serde(rename = "bondCode")]
    bond_code: &'a str,
    cls: &'a str,
}

/// 신한투자증권 채권 정보 제공자.
pub struct ShinhanBondProvider {
    client: Client,
    base_url: String,
    cache: Arc<RwLock<HashMap<String, BondInfo>>>,
}

impl ShinhanBondProvider {
    /// 기본 URL로 생성.
    pub fn new() -> Result<Self, ExchangeError> {
        Self::with_base_url(BOND_BASE_URL)
    }

    /// 기본 URL을 지정해 생성.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// 채권 정보 조회 (캐시 우선).
    pub async fn get_bond_info(&self, code: &str) -> Result<BondInfo, ExchangeError> {
        if let Some(info) = self.cache.read().await.get(code) {
            return Ok(info.clone());
        }

        let (coupons, maturity) = self.fetch_issue_info(code).await?;
        let current_price = self.fetch_current_price(code).await?;

        let info = BondInfo {
            code: code.to_string(),
            coupons,
            maturity,
            current_price,
        };

        debug!(code, %maturity, %current_price, coupons = info.coupons.len(), "Bond info cached");
        self.cache
            .write()
            .await
            .insert(code.to_string(), info.clone());

        Ok(info)
    }

    /// 캐시된 채권 수.
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn post(&self, screen: &str, code: &str) -> Result<Value, ExchangeError> {
        let url = format!("{}/{}/data.do", self.base_url, screen);

        let response = self
            .client
            .post(&url)
            .json(&BondRequest {
                bond_code: code,
                cls: code,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(code, screen, %status, "Bond info request failed");
            return Err(ExchangeError::http(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// 발행정보: (이자 지급 일정, 만기일).
    async fn fetch_issue_info(
        &self,
        code: &str,
    ) -> Result<(Vec<CouponPayment>, NaiveDate), ExchangeError> {
        let data = self.post(ISSUE_INFO_SCREEN, code).await?;
        parse_issue_info(code, &data)
    }

    /// 상세시세: 현재가.
    async fn fetch_current_price(&self, code: &str) -> Result<Decimal, ExchangeError> {
        let data = self.post(PRICE_INFO_SCREEN, code).await?;
        parse_current_price(code, &data)
    }
}

fn parse_issue_info(
    code: &str,
    data: &Value,
) -> Result<(Vec<CouponPayment>, NaiveDate), ExchangeError> {
    let body = data
        .get("body")
        .filter(|b| !b.is_null())
        .ok_or_else(|| ExchangeError::NotFound(format!("bond issue info for {}", code)))?;

    let rows = body
        .pointer("/bondProfitInfo/반복데이타0")
        .and_then(Value::as_array)
        .ok_or_else(|| ExchangeError::ParseError("missing bondProfitInfo rows".to_string()))?;

    // 각 행은 (지급일자, 지급이율, 세전지급금액) 순서의 객체
    let coupons = rows
        .iter()
        .map(|row| {
            let fields: Vec<&Value> = match row {
                Value::Object(map) => map.values().collect(),
                Value::Array(items) => items.iter().collect(),
                _ => Vec::new(),
            };
            if fields.len() < 3 {
                return Err(ExchangeError::ParseError(format!(
                    "coupon row has {} fields",
                    fields.len()
                )));
            }
            Ok(CouponPayment {
                date: parse_date_value(fields[0])?,
                rate: parse_decimal_value(fields[1])?,
                amount: parse_decimal_value(fields[2])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let maturity = body
        .pointer("/bondMaster/만기일자")
        .ok_or_else(|| ExchangeError::ParseError("missing 만기일자".to_string()))
        .and_then(parse_date_value)?;

    Ok((coupons, maturity))
}

fn parse_current_price(code: &str, data: &Value) -> Result<Decimal, ExchangeError> {
    match data.get("body") {
        None | Some(Value::Null) => {
            debug!(code, "No price body, assuming redemption price");
            Ok(REDEMPTION_PRICE)
        }
        Some(body) => body
            .pointer("/tr1/현재가")
            .ok_or_else(|| ExchangeError::ParseError("missing tr1.현재가".to_string()))
            .and_then(parse_decimal_value),
    }
}

/// 문자열/숫자 값을 Decimal로 변환 (천 단위 구분자 허용).
fn parse_decimal_value(value: &Value) -> Result<Decimal, ExchangeError> {
    let text = match value {
        Value::String(s) => s.replace(',', ""),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ExchangeError::ParseError(format!(
                "expected number, got {}",
                other
            )))
        }
    };
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| ExchangeError::ParseError(format!("Invalid decimal: {}", text)))
}

/// "YYYYMMDD", "YYYY-MM-DD", "YYYY.MM.DD" 형식 날짜를 변환.
fn parse_date_value(value: &Value) -> Result<NaiveDate, ExchangeError> {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ExchangeError::ParseError(format!(
                "expected date, got {}",
                other
            )))
        }
    };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    NaiveDate::parse_from_str(&digits, "%Y%m%d")
        .map_err(|_| ExchangeError::ParseError(format!("Invalid date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_issue_info_positional_rows() {
        let data = json!({
            "body": {
                "bondProfitInfo": {
                    "반복데이타0": [
                        {"지급일": "2024.03.15", "이율": "3.5", "금액": "87.5"},
                        {"지급일": "2024.06.15", "이율": "3.5", "금액": "1,087.5"}
                    ]
                },
                "bondMaster": {"만기일자": "20240615"}
            }
        });

        let (coupons, maturity) = parse_issue_info("KR1", &data).unwrap();
        assert_eq!(coupons.len(), 2);
        assert_eq!(coupons[0].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(coupons[1].amount, dec!(1087.5));
        assert_eq!(maturity, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn test_missing_price_body_is_redemption() {
        assert_eq!(parse_current_price("KR1", &json!({})).unwrap(), REDEMPTION_PRICE);
        assert_eq!(
            parse_current_price("KR1", &json!({"body": null})).unwrap(),
            REDEMPTION_PRICE
        );
        assert_eq!(
            parse_current_price("KR1", &json!({"body": {"tr1": {"현재가": "9,950.5"}}})).unwrap(),
            dec!(9950.5)
        );
    }

    #[test]
    fn test_parse_values() {
        assert_eq!(parse_decimal_value(&json!(12.5)).unwrap(), dec!(12.5));
        assert_eq!(parse_decimal_value(&json!("")).unwrap(), Decimal::ZERO);
        assert!(parse_decimal_value(&json!(true)).is_err());
        assert!(parse_date_value(&json!("2024-13-01")).is_err());
    }
}
