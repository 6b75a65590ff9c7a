//! KIS 국내 주식 REST API 클라이언트.
//!
//! # 지원 기능
//!
//! - 투자계좌 자산현황 조회
//! - 주식잔고 조회
//! - 주식현재가 일자별 시세
//! - 국내 휴장일 조회
//! - 주식 일별 주문체결 조회 (연속 조회 포함)

use super::auth::KisOAuth;
use super::config::KisEnvironment;
use super::tr_id;
use crate::ExchangeError;
use chrono::NaiveDate;
use owlman_core::{DailyBar, PriceHistory};
use reqwest::header::HeaderMap;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 투자계좌 자산현황의 자산 구분 (응답 행 순서와 동일).
pub const ASSET_CLASSES: [&str; 19] = [
    "주식",
    "펀드/MMW",
    "채권",
    "ELS/DLS",
    "WRAP",
    "신탁/퇴직연금/외화신탁",
    "RP/발행어음",
    "해외주식",
    "해외채권",
    "금현물",
    "CD/CP",
    "단기사채",
    "타사상품",
    "외화단기사채",
    "외화 ELS/DLS",
    "외화",
    "예수금+CMA",
    "청약자예수금",
    "<합계>",
];

/// 연속 조회 최대 페이지 수.
const MAX_ORDER_PAGES: usize = 200;

/// KIS 국내 주식 REST API 클라이언트.
///
/// `KisOAuth`를 `Arc`로 공유하므로 동시에 여러 요청을 보내도 토큰은 한 번만 발급됩니다.
pub struct KisKrClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisKrClient {
    /// 새로운 국내 주식 클라이언트 생성.
    pub fn new(oauth: KisOAuth) -> Result<Self, ExchangeError> {
        Self::with_shared_oauth(Arc::new(oauth))
    }

    /// 공유된 OAuth로 클라이언트 생성.
    pub fn with_shared_oauth(oauth: Arc<KisOAuth>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(oauth.config().timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { oauth, client })
    }

    /// 내부 OAuth 참조 반환.
    pub fn oauth(&self) -> &Arc<KisOAuth> {
        &self.oauth
    }

    /// 환경에 따른 적절한 tr_id 반환.
    fn get_tr_id<'a>(&self, real_id: &'a str, paper_id: &'a str) -> &'a str {
        match self.oauth.config().environment {
            KisEnvironment::Real => real_id,
            KisEnvironment::Paper => paper_id,
        }
    }

    /// GET 요청을 보내고 (본문, 응답 헤더)를 반환합니다.
    async fn get(
        &self,
        path: &str,
        tr_id: &str,
        tr_cont: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<(String, HeaderMap), ExchangeError> {
        let url = format!("{}{}", self.oauth.config().rest_base_url(), path);
        let headers = self.oauth.build_headers(tr_id, tr_cont).await?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExchangeError::Timeout(e.to_string())
                } else {
                    ExchangeError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!(tr_id, %status, "KIS request failed: {}", body);
            return Err(ExchangeError::http(status, body));
        }

        debug!(tr_id, bytes = body.len(), "KIS response received");

        Ok((body, response_headers))
    }

    // ========================================
    // Account APIs (계좌)
    // ========================================

    /// 투자계좌 자산현황 조회.
    ///
    /// 자산 구분별 19개 행(마지막은 `<합계>`)을 순서대로 반환합니다.
    pub async fn get_account_balance(&self) -> Result<Vec<AssetBalanceRow>, ExchangeError> {
        let config = self.oauth.config();
        let cano = config.cano();

        let (body, _) = self
            .get(
                "/uapi/domestic-stock/v1/trading/inquire-account-balance",
                tr_id::KR_ACCOUNT_BALANCE,
                None,
                &[
                    ("CANO", cano.as_str()),
                    ("ACNT_PRDT_CD", config.acnt_prdt_cd()),
                    ("INQR_DVSN_1", ""),
                    ("BSPR_BF_DT_APLY_YN", ""),
                ],
            )
            .await?;

        let resp: KisAccountBalanceResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse account balance response: {}", e))
        })?;
        check_rt(&resp.rt_cd, resp.msg_cd, resp.msg1)?;

        if resp.output1.len() != ASSET_CLASSES.len() {
            return Err(ExchangeError::ParseError(format!(
                "expected {} asset rows, got {}",
                ASSET_CLASSES.len(),
                resp.output1.len()
            )));
        }

        Ok(ASSET_CLASSES
            .iter()
            .zip(resp.output1)
            .map(|(class, row)| row.into_row(class))
            .collect())
    }

    /// 주식잔고 조회 (보유수량 > 0인 종목만).
    pub async fn get_stock_balance(&self) -> Result<Vec<KrHolding>, ExchangeError> {
        let config = self.oauth.config();
        let cano = config.cano();
        let tr_id = self.get_tr_id(tr_id::KR_BALANCE_REAL, tr_id::KR_BALANCE_PAPER);

        let (body, _) = self
            .get(
                "/uapi/domestic-stock/v1/trading/inquire-balance",
                tr_id,
                None,
                &[
                    ("CANO", cano.as_str()),
                    ("ACNT_PRDT_CD", config.acnt_prdt_cd()),
                    ("AFHR_FLPR_YN", "N"),
                    ("OFL_YN", ""),
                    ("INQR_DVSN", "02"),
                    ("UNPR_DVSN", "01"),
                    ("FUND_STTL_ICLD_YN", "N"),
                    ("FNCG_AMT_AUTO_RDPT_YN", "N"),
                    ("PRCS_DVSN", "01"),
                    ("CTX_AREA_FK100", ""),
                    ("CTX_AREA_NK100", ""),
                ],
            )
            .await?;

        let resp: KisBalanceResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse balance response: {}", e))
        })?;
        check_rt(&resp.rt_cd, resp.msg_cd, resp.msg1)?;

        Ok(resp
            .output1
            .into_iter()
            .filter(|h| h.quantity > Decimal::ZERO)
            .collect())
    }

    // ========================================
    // Market Data APIs (시세)
    // ========================================

    /// 주식현재가 일자별 시세 (수정주가, 최근 30거래일).
    ///
    /// 거래일 오름차순으로 정렬된 이력을 반환합니다.
    pub async fn get_daily_price(&self, stock_code: &str) -> Result<PriceHistory, ExchangeError> {
        let (body, _) = self
            .get(
                "/uapi/domestic-stock/v1/quotations/inquire-daily-price",
                tr_id::KR_DAILY_PRICE,
                None,
                &[
                    ("FID_COND_MRKT_DIV_CODE", "J"),
                    ("FID_INPUT_ISCD", stock_code),
                    ("FID_PERIOD_DIV_CODE", "D"),
                    ("FID_ORG_ADJ_PRC", "0"),
                ],
            )
            .await?;

        let resp: KisDailyPriceResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse daily price response: {}", e))
        })?;
        check_rt(&resp.rt_cd, resp.msg_cd, resp.msg1)?;

        let bars = resp.output.iter().map(KrOhlcv::to_bar).collect();
        Ok(PriceHistory::new(stock_code, bars))
    }

    /// 국내 휴장일 조회. 기준일이 영업일이 아니면 `true`.
    pub async fn is_holiday(&self, date: NaiveDate) -> Result<bool, ExchangeError> {
        let base_date = date.format("%Y%m%d").to_string();

        let (body, _) = self
            .get(
                "/uapi/domestic-stock/v1/quotations/chk-holiday",
                tr_id::KR_HOLIDAY,
                None,
                &[
                    ("BASS_DT", base_date.as_str()),
                    ("CTX_AREA_NK", ""),
                    ("CTX_AREA_FK", ""),
                ],
            )
            .await?;

        let resp: KisHolidayResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse holiday response: {}", e))
        })?;
        check_rt(&resp.rt_cd, resp.msg_cd, resp.msg1)?;

        let first = resp
            .output
            .first()
            .ok_or_else(|| ExchangeError::NotFound(format!("holiday info for {}", base_date)))?;

        Ok(first.business_day == "N")
    }

    // ========================================
    // Order History APIs (주문체결)
    // ========================================

    /// 주식 일별 주문체결 조회 (한 페이지).
    ///
    /// `ctx_area_fk100`이 비어 있지 않으면 연속 조회(`tr_cont: N`)로 요청합니다.
    pub async fn get_daily_orders(
        &self,
        query: &DailyOrderQuery,
        ctx_area_fk100: &str,
        ctx_area_nk100: &str,
    ) -> Result<DailyOrderPage, ExchangeError> {
        let config = self.oauth.config();
        let cano = config.cano();
        let tr_id = self.get_tr_id(tr_id::KR_DAILY_ORDERS_REAL, tr_id::KR_DAILY_ORDERS_PAPER);
        let start = query.start_date.format("%Y%m%d").to_string();
        let end = query.end_date.format("%Y%m%d").to_string();
        let tr_cont = (!ctx_area_fk100.is_empty()).then_some("N");

        let (body, headers) = self
            .get(
                "/uapi/domestic-stock/v1/trading/inquire-daily-ccld",
                tr_id,
                tr_cont,
                &[
                    ("CANO", cano.as_str()),
                    ("ACNT_PRDT_CD", config.acnt_prdt_cd()),
                    ("INQR_STRT_DT", start.as_str()),
                    ("INQR_END_DT", end.as_str()),
                    ("SLL_BUY_DVSN_CD", query.side.as_str()),
                    ("INQR_DVSN", if query.ascending { "01" } else { "00" }),
                    ("PDNO", query.product_no.as_str()),
                    ("CCLD_DVSN", if query.filled_only { "01" } else { "00" }),
                    ("ORD_GNO_BRNO", ""),
                    ("ODNO", ""),
                    ("INQR_DVSN_3", "00"),
                    ("INQR_DVSN_1", ""),
                    ("CTX_AREA_FK100", ctx_area_fk100),
                    ("CTX_AREA_NK100", ctx_area_nk100),
                ],
            )
            .await?;

        let resp: KisDailyOrdersResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse daily order response: {}", e))
        })?;
        check_rt(&resp.rt_cd, resp.msg_cd, resp.msg1)?;

        let tr_cont = headers
            .get("tr_cont")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(DailyOrderPage {
            executions: resp.output1,
            tr_cont,
            ctx_area_fk100: resp.ctx_area_fk100.trim().to_string(),
            ctx_area_nk100: resp.ctx_area_nk100.trim().to_string(),
        })
    }

    /// 주식 일별 주문체결 전체 조회.
    ///
    /// 응답 헤더 `tr_cont`가 마지막 페이지(`D`/`E`)를 가리킬 때까지 이어서 조회합니다.
    pub async fn get_all_daily_orders(
        &self,
        query: &DailyOrderQuery,
    ) -> Result<Vec<KrOrderExecution>, ExchangeError> {
        let mut executions = Vec::new();
        let mut fk = String::new();
        let mut nk = String::new();

        for page_no in 1..=MAX_ORDER_PAGES {
            let page = self.get_daily_orders(query, &fk, &nk).await?;
            let has_more = page.has_more();
            debug!(
                page = page_no,
                rows = page.executions.len(),
                tr_cont = ?page.tr_cont,
                "Daily order page loaded"
            );

            executions.extend(page.executions);
            if !has_more {
                info!(total = executions.len(), pages = page_no, "Daily orders loaded");
                return Ok(executions);
            }
            fk = page.ctx_area_fk100;
            nk = page.ctx_area_nk100;
        }

        warn!(
            pages = MAX_ORDER_PAGES,
            "Daily order pagination limit reached, result may be truncated"
        );
        Ok(executions)
    }
}

// ========================================
// 요청/응답 타입
// ========================================

/// 투자계좌 자산현황의 한 행.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetBalanceRow {
    /// 자산 구분 (예: "주식", "<합계>")
    pub asset_class: String,
    /// 매입금액
    pub purchase_amount: Decimal,
    /// 평가금액
    pub eval_amount: Decimal,
    /// 평가손익금액
    pub eval_profit_loss: Decimal,
    /// 신용대출금액
    pub credit_loan_amount: Decimal,
    /// 실제순자산금액
    pub real_net_assets: Decimal,
    /// 전체비중율 (%)
    pub total_weight_rate: Decimal,
}

impl AssetBalanceRow {
    /// 합계 행 여부.
    pub fn is_total(&self) -> bool {
        self.asset_class == "<합계>"
    }

    /// 채권 행 여부.
    pub fn is_bond(&self) -> bool {
        self.asset_class == "채권"
    }
}

/// 국내 계좌 보유 종목.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KrHolding {
    /// 종목코드
    #[serde(rename = "pdno")]
    pub stock_code: String,
    /// 종목명
    #[serde(rename = "prdt_name")]
    pub stock_name: String,
    /// 보유수량
    #[serde(rename = "hldg_qty", deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
    /// 매입평균가격
    #[serde(rename = "pchs_avg_pric", deserialize_with = "deserialize_decimal")]
    pub avg_price: Decimal,
    /// 매입금액
    #[serde(rename = "pchs_amt", default, deserialize_with = "deserialize_decimal")]
    pub purchase_amount: Decimal,
    /// 현재가
    #[serde(rename = "prpr", deserialize_with = "deserialize_decimal")]
    pub current_price: Decimal,
    /// 평가금액
    #[serde(rename = "evlu_amt", deserialize_with = "deserialize_decimal")]
    pub eval_amount: Decimal,
    /// 평가손익금액
    #[serde(rename = "evlu_pfls_amt", deserialize_with = "deserialize_decimal")]
    pub profit_loss: Decimal,
    /// 평가손익률 (%)
    #[serde(rename = "evlu_pfls_rt", default, deserialize_with = "deserialize_decimal")]
    pub profit_loss_rate: Decimal,
}

/// 일자별 시세 한 행.
#[derive(Debug, Clone, Deserialize)]
pub struct KrOhlcv {
    /// 영업일자
    #[serde(rename = "stck_bsop_date", deserialize_with = "deserialize_kis_date")]
    pub date: NaiveDate,
    /// 시가
    #[serde(rename = "stck_oprc", deserialize_with = "deserialize_decimal")]
    pub open: Decimal,
    /// 고가
    #[serde(rename = "stck_hgpr", deserialize_with = "deserialize_decimal")]
    pub high: Decimal,
    /// 저가
    #[serde(rename = "stck_lwpr", deserialize_with = "deserialize_decimal")]
    pub low: Decimal,
    /// 종가
    #[serde(rename = "stck_clpr", deserialize_with = "deserialize_decimal")]
    pub close: Decimal,
    /// 누적 거래량
    #[serde(rename = "acml_vol", deserialize_with = "deserialize_decimal")]
    pub volume: Decimal,
    /// 전일 대비
    #[serde(rename = "prdy_vrss", default, deserialize_with = "deserialize_decimal")]
    pub change: Decimal,
    /// 전일 대비율 (%)
    #[serde(rename = "prdy_ctrt", default, deserialize_with = "deserialize_decimal")]
    pub change_rate: Decimal,
    /// 외국인 소진율 (%)
    #[serde(rename = "hts_frgn_ehrt", default, deserialize_with = "deserialize_decimal")]
    pub foreign_exhaustion_rate: Decimal,
    /// 외국인 순매수 수량
    #[serde(rename = "frgn_ntby_qty", default, deserialize_with = "deserialize_decimal")]
    pub foreign_net_buy: Decimal,
}

impl KrOhlcv {
    /// 도메인 일봉으로 변환.
    pub fn to_bar(&self) -> DailyBar {
        DailyBar::new(
            self.date,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume.to_u64().unwrap_or(0),
        )
    }
}

/// 일별 주문체결 조회 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyOrderQuery {
    /// 조회 시작일
    pub start_date: NaiveDate,
    /// 조회 종료일
    pub end_date: NaiveDate,
    /// 매도매수 구분 ("00" 전체, "01" 매도, "02" 매수)
    pub side: String,
    /// 정순 조회 여부 (false면 역순)
    pub ascending: bool,
    /// 종목번호 (빈 문자열이면 전 종목)
    pub product_no: String,
    /// 체결 건만 조회
    pub filled_only: bool,
}

impl DailyOrderQuery {
    /// 기간만 지정한 기본 조회 조건 (전체, 정순, 체결분).
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            side: super::side_code::ALL.to_string(),
            ascending: true,
            product_no: String::new(),
            filled_only: true,
        }
    }
}

/// 일별 주문체결 조회 한 페이지.
#[derive(Debug, Clone)]
pub struct DailyOrderPage {
    /// 체결 내역
    pub executions: Vec<KrOrderExecution>,
    /// 응답 헤더 tr_cont (F/M: 다음 페이지 있음, D/E: 마지막)
    pub tr_cont: Option<String>,
    /// 연속 조회 키
    pub ctx_area_fk100: String,
    /// 연속 조회 키
    pub ctx_area_nk100: String,
}

impl DailyOrderPage {
    /// 다음 페이지 존재 여부.
    pub fn has_more(&self) -> bool {
        matches!(self.tr_cont.as_deref(), Some("F") | Some("M"))
    }
}

/// 일별 주문체결 한 건.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KrOrderExecution {
    /// 주문일자
    #[serde(rename = "ord_dt", deserialize_with = "deserialize_kis_date")]
    pub order_date: NaiveDate,
    /// 주문번호
    #[serde(rename = "odno")]
    pub order_no: String,
    /// 원주문번호
    #[serde(rename = "orgn_odno", default)]
    pub original_order_no: String,
    /// 매도매수구분코드 (01=매도, 02=매수)
    #[serde(rename = "sll_buy_dvsn_cd")]
    pub side_code: String,
    /// 상품번호
    #[serde(rename = "pdno")]
    pub product_no: String,
    /// 상품명
    #[serde(rename = "prdt_name")]
    pub product_name: String,
    /// 주문수량
    #[serde(rename = "ord_qty", default, deserialize_with = "deserialize_decimal")]
    pub order_qty: Decimal,
    /// 주문단가
    #[serde(rename = "ord_unpr", default, deserialize_with = "deserialize_decimal")]
    pub order_price: Decimal,
    /// 총체결수량
    #[serde(rename = "tot_ccld_qty", deserialize_with = "deserialize_decimal")]
    pub filled_qty: Decimal,
    /// 평균가
    #[serde(rename = "avg_prvs", default, deserialize_with = "deserialize_decimal")]
    pub avg_price: Decimal,
    /// 총체결금액
    #[serde(rename = "tot_ccld_amt", deserialize_with = "deserialize_decimal")]
    pub filled_amount: Decimal,
    /// 상품유형코드 (302 = 채권)
    #[serde(rename = "prdt_type_cd", default)]
    pub product_type_code: String,
}

impl KrOrderExecution {
    /// 유일 주문 코드 ("{주문일자}-{주문번호}").
    pub fn unique_code(&self) -> String {
        format!("{}-{}", self.order_date.format("%Y%m%d"), self.order_no)
    }

    /// 평균 단가 (총체결금액 / 총체결수량). 체결수량이 0이면 `None`.
    pub fn avg_unit_price(&self) -> Option<Decimal> {
        if self.filled_qty.is_zero() {
            None
        } else {
            Some(self.filled_amount / self.filled_qty)
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side_code == super::side_code::BUY
    }

    pub fn is_sell(&self) -> bool {
        self.side_code == super::side_code::SELL
    }
}

// ========================================
// API 응답 래퍼
// ========================================

#[derive(Debug, Deserialize)]
struct KisAssetRow {
    #[serde(deserialize_with = "deserialize_decimal")]
    pchs_amt: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    evlu_amt: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    evlu_pfls_amt: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    crdt_lnd_amt: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    real_nass_amt: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    whol_weit_rt: Decimal,
}

impl KisAssetRow {
    fn into_row(self, asset_class: &str) -> AssetBalanceRow {
        AssetBalanceRow {
            asset_class: asset_class.to_string(),
            purchase_amount: self.pchs_amt,
            eval_amount: self.evlu_amt,
            eval_profit_loss: self.evlu_pfls_amt,
            credit_loan_amount: self.crdt_lnd_amt,
            real_net_assets: self.real_nass_amt,
            total_weight_rate: self.whol_weit_rt,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KisAccountBalanceResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output1: Vec<KisAssetRow>,
}

#[derive(Debug, Deserialize)]
struct KisBalanceResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output1: Vec<KrHolding>,
}

#[derive(Debug, Deserialize)]
struct KisDailyPriceResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output: Vec<KrOhlcv>,
}

#[derive(Debug, Deserialize)]
struct KrHolidayItem {
    #[serde(rename = "bzdy_yn")]
    business_day: String,
}

#[derive(Debug, Deserialize)]
struct KisHolidayResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output: Vec<KrHolidayItem>,
}

#[derive(Debug, Deserialize)]
struct KisDailyOrdersResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    ctx_area_fk100: String,
    #[serde(default)]
    ctx_area_nk100: String,
    #[serde(default)]
    output1: Vec<KrOrderExecution>,
}

// ========================================
// 유틸리티 함수
// ========================================

/// 응답 코드(rt_cd)가 "0"이 아니면 API 에러.
fn check_rt(rt_cd: &str, msg_cd: String, msg1: String) -> Result<(), ExchangeError> {
    if rt_cd == "0" {
        Ok(())
    } else {
        Err(ExchangeError::ApiError {
            code: msg_cd,
            message: msg1,
        })
    }
}

/// 문자열을 Decimal로 역직렬화 ("", "-"는 0).
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    let s = s.trim();
    if s.is_empty() || s == "-" {
        return Ok(Decimal::ZERO);
    }
    s.parse::<Decimal>()
        .map_err(|_| serde::de::Error::custom(format!("Invalid decimal: {}", s)))
}

/// "YYYYMMDD" 문자열을 날짜로 역직렬화.
fn deserialize_kis_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|_| serde::de::Error::custom(format!("Invalid date: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_decimal() {
        #[derive(Deserialize)]
        struct Test {
            #[serde(deserialize_with = "deserialize_decimal")]
            value: Decimal,
        }
        let result: Test = serde_json::from_str(r#"{"value": "12345.67"}"#).unwrap();
        assert_eq!(result.value, dec!(12345.67));

        let result: Test = serde_json::from_str(r#"{"value": "-"}"#).unwrap();
        assert_eq!(result.value, Decimal::ZERO);
    }

    #[test]
    fn test_order_execution_fields() {
        let json = r#"{
            "ord_dt": "20240102", "odno": "0000012345", "orgn_odno": "",
            "sll_buy_dvsn_cd": "02", "pdno": "KR6000001", "prdt_name": "국고채",
            "ord_qty": "10", "ord_unpr": "0", "tot_ccld_qty": "4",
            "avg_prvs": "9876", "tot_ccld_amt": "39502", "prdt_type_cd": "302"
        }"#;
        let exec: KrOrderExecution = serde_json::from_str(json).unwrap();

        assert_eq!(exec.unique_code(), "20240102-0000012345");
        assert_eq!(exec.avg_unit_price(), Some(dec!(9875.5)));
        assert!(exec.is_buy());
        assert!(!exec.is_sell());
        assert_eq!(exec.product_type_code, "302");
    }

    #[test]
    fn test_zero_fill_has_no_unit_price() {
        let json = r#"{
            "ord_dt": "20240102", "odno": "1", "sll_buy_dvsn_cd": "01",
            "pdno": "A", "prdt_name": "a", "tot_ccld_qty": "0", "tot_ccld_amt": "0"
        }"#;
        let exec: KrOrderExecution = serde_json::from_str(json).unwrap();
        assert_eq!(exec.avg_unit_price(), None);
    }

    #[test]
    fn test_page_continuation_flag() {
        let page = |cont: Option<&str>| DailyOrderPage {
            executions: vec![],
            tr_cont: cont.map(str::to_string),
            ctx_area_fk100: String::new(),
            ctx_area_nk100: String::new(),
        };
        assert!(page(Some("F")).has_more());
        assert!(page(Some("M")).has_more());
        assert!(!page(Some("D")).has_more());
        assert!(!page(Some("E")).has_more());
        assert!(!page(None).has_more());
    }

    #[test]
    fn test_asset_row_flags() {
        let row = KisAssetRow {
            pchs_amt: dec!(1),
            evlu_amt: dec!(2),
            evlu_pfls_amt: dec!(1),
            crdt_lnd_amt: Decimal::ZERO,
            real_nass_amt: dec!(2),
            whol_weit_rt: dec!(10),
        };
        assert!(row.into_row("채권").is_bond());
        assert_eq!(ASSET_CLASSES[18], "<합계>");
    }
}
