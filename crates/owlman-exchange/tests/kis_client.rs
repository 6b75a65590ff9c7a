//! KIS 국내 주식 클라이언트 HTTP 통합 테스트 (mockito).

use chrono::NaiveDate;
use mockito::{Matcher, Server};
use owlman_exchange::connector::kis::{
    DailyOrderQuery, KisAccountType, KisConfig, KisKrClient, KisOAuth,
};
use owlman_exchange::{AccountDataSource, ExchangeError, MarketDataSource};
use rust_decimal_macros::dec;
use serde_json::json;

fn client_for(server: &Server) -> KisKrClient {
    let config = KisConfig::new(
        "test-app-key",
        "test-app-secret",
        "12345678-01",
        KisAccountType::RealGeneral,
    )
    .with_access_token("test-token")
    .with_base_url(server.url());
    KisKrClient::new(KisOAuth::new(config).unwrap()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn asset_row(eval: &str, weight: &str) -> serde_json::Value {
    json!({
        "pchs_amt": eval, "evlu_amt": eval, "evlu_pfls_amt": "0",
        "crdt_lnd_amt": "0", "real_nass_amt": eval, "whol_weit_rt": weight
    })
}

#[tokio::test]
async fn test_daily_price_sorted_ascending() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/inquire-daily-price")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("FID_INPUT_ISCD".into(), "069500".into()),
            Matcher::UrlEncoded("FID_PERIOD_DIV_CODE".into(), "D".into()),
            Matcher::UrlEncoded("FID_ORG_ADJ_PRC".into(), "0".into()),
        ]))
        .match_header("tr_id", "FHKST01010400")
        .match_header("authorization", "Bearer test-token")
        .match_header("custtype", "P")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "rt_cd": "0", "msg_cd": "MCA00000", "msg1": "정상처리",
                "output": [
                    {"stck_bsop_date": "20240103", "stck_oprc": "101", "stck_hgpr": "105",
                     "stck_lwpr": "100", "stck_clpr": "104", "acml_vol": "1000",
                     "prdy_vrss": "3", "prdy_ctrt": "2.97", "hts_frgn_ehrt": "10.5",
                     "frgn_ntby_qty": "-20"},
                    {"stck_bsop_date": "20240102", "stck_oprc": "99", "stck_hgpr": "102",
                     "stck_lwpr": "98", "stck_clpr": "101", "acml_vol": "900",
                     "prdy_vrss": "1", "prdy_ctrt": "1.0", "hts_frgn_ehrt": "10.4",
                     "frgn_ntby_qty": "5"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let history = client.daily_history("069500").await.unwrap();

    mock.assert_async().await;
    assert_eq!(history.code, "069500");
    assert_eq!(history.len(), 2);
    assert_eq!(history.bars()[0].date, date(2024, 1, 2));
    assert_eq!(history.last_close(), Some(dec!(104)));
    assert_eq!(history.bars()[1].volume, 1000);
}

#[tokio::test]
async fn test_api_error_code_from_rt_cd() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/inquire-daily-price")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"rt_cd": "1", "msg_cd": "EGW00201", "msg1": "초당 거래건수를 초과하였습니다."}).to_string())
        .create_async()
        .await;

    let err = client_for(&server).get_daily_price("069500").await.unwrap_err();
    match err {
        ExchangeError::ApiError { code, message } => {
            assert_eq!(code, "EGW00201");
            assert!(message.contains("초과"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/chk-holiday")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let err = client_for(&server).is_holiday(date(2024, 1, 1)).await.unwrap_err();
    assert!(matches!(err, ExchangeError::ApiError { ref code, .. } if code == "500"));
}

#[tokio::test]
async fn test_is_holiday() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/chk-holiday")
        .match_query(Matcher::UrlEncoded("BASS_DT".into(), "20240101".into()))
        .match_header("tr_id", "CTCA0903R")
        .with_status(200)
        .with_body(json!({
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "output": [{"bass_dt": "20240101", "bzdy_yn": "N"}, {"bass_dt": "20240102", "bzdy_yn": "Y"}]
        }).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/chk-holiday")
        .match_query(Matcher::UrlEncoded("BASS_DT".into(), "20240102".into()))
        .with_status(200)
        .with_body(json!({
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "output": [{"bass_dt": "20240102", "bzdy_yn": "Y"}]
        }).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    assert!(client.is_holiday(date(2024, 1, 1)).await.unwrap());
    assert!(!client.is_holiday(date(2024, 1, 2)).await.unwrap());
}

#[tokio::test]
async fn test_account_balance_rows_named_in_order() {
    let mut server = Server::new_async().await;
    let mut rows: Vec<serde_json::Value> = (0..18).map(|_| asset_row("0", "0")).collect();
    rows[0] = asset_row("3000000", "60");
    rows[2] = asset_row("2000000", "40");
    rows.push(asset_row("5000000", "100"));

    server
        .mock("GET", "/uapi/domestic-stock/v1/trading/inquire-account-balance")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("CANO".into(), "12345678".into()),
            Matcher::UrlEncoded("ACNT_PRDT_CD".into(), "01".into()),
        ]))
        .match_header("tr_id", "CTRP6548R")
        .with_status(200)
        .with_body(json!({"rt_cd": "0", "msg_cd": "", "msg1": "", "output1": rows, "output2": {}}).to_string())
        .create_async()
        .await;

    let balance = client_for(&server).asset_balance().await.unwrap();
    assert_eq!(balance.len(), 19);
    assert_eq!(balance[0].asset_class, "주식");
    assert_eq!(balance[0].eval_amount, dec!(3000000));
    assert!(balance[2].is_bond());
    assert!(balance[18].is_total());
    assert_eq!(balance[18].total_weight_rate, dec!(100));
}

#[tokio::test]
async fn test_account_balance_row_count_mismatch() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/trading/inquire-account-balance")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"rt_cd": "0", "output1": [asset_row("1", "1")]}).to_string())
        .create_async()
        .await;

    let err = client_for(&server).get_account_balance().await.unwrap_err();
    assert!(matches!(err, ExchangeError::ParseError(_)));
}

#[tokio::test]
async fn test_stock_balance_filters_empty_positions() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/trading/inquire-balance")
        .match_query(Matcher::Any)
        .match_header("tr_id", "TTTC8434R")
        .with_status(200)
        .with_body(json!({
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "output1": [
                {"pdno": "069500", "prdt_name": "KODEX 200", "hldg_qty": "10",
                 "pchs_avg_pric": "35000", "pchs_amt": "350000", "prpr": "36000",
                 "evlu_amt": "360000", "evlu_pfls_amt": "10000", "evlu_pfls_rt": "2.85"},
                {"pdno": "114800", "prdt_name": "KODEX 인버스", "hldg_qty": "0",
                 "pchs_avg_pric": "0", "pchs_amt": "0", "prpr": "4000",
                 "evlu_amt": "0", "evlu_pfls_amt": "0", "evlu_pfls_rt": "0"}
            ],
            "output2": []
        }).to_string())
        .create_async()
        .await;

    let holdings = client_for(&server).stock_holdings().await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].stock_code, "069500");
    assert_eq!(holdings[0].quantity, dec!(10));
}

#[tokio::test]
async fn test_daily_orders_follow_continuation() {
    let mut server = Server::new_async().await;
    let path = "/uapi/domestic-stock/v1/trading/inquire-daily-ccld";
    let order = |odno: &str, side: &str| {
        json!({
            "ord_dt": "20240105", "odno": odno, "orgn_odno": "", "sll_buy_dvsn_cd": side,
            "pdno": "KR103502GE97", "prdt_name": "국고채권", "ord_qty": "10", "ord_unpr": "0",
            "tot_ccld_qty": "10", "avg_prvs": "9900", "tot_ccld_amt": "99000",
            "prdt_type_cd": "302"
        })
    };

    let first = server
        .mock("GET", path)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("INQR_STRT_DT".into(), "20240101".into()),
            Matcher::UrlEncoded("INQR_END_DT".into(), "20240131".into()),
            Matcher::UrlEncoded("CTX_AREA_FK100".into(), "".into()),
        ]))
        .match_header("tr_id", "TTTC8001R")
        .match_header("tr_cont", Matcher::Missing)
        .with_status(200)
        .with_header("tr_cont", "F")
        .with_body(json!({
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "ctx_area_fk100": "FK1   ", "ctx_area_nk100": "NK1   ",
            "output1": [order("0001", "02")]
        }).to_string())
        .create_async()
        .await;

    let second = server
        .mock("GET", path)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("CTX_AREA_FK100".into(), "FK1".into()),
            Matcher::UrlEncoded("CTX_AREA_NK100".into(), "NK1".into()),
        ]))
        .match_header("tr_cont", "N")
        .with_status(200)
        .with_header("tr_cont", "D")
        .with_body(json!({
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "ctx_area_fk100": "", "ctx_area_nk100": "",
            "output1": [order("0002", "01")]
        }).to_string())
        .create_async()
        .await;

    let client = client_for(&server);
    let query = DailyOrderQuery::new(date(2024, 1, 1), date(2024, 1, 31));
    let orders = client.get_all_daily_orders(&query).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].unique_code(), "20240105-0001");
    assert!(orders[1].is_sell());
    assert_eq!(orders[1].avg_unit_price(), Some(dec!(9900)));
}

#[tokio::test]
async fn test_token_issued_when_not_supplied() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/oauth2/tokenP")
        .with_status(200)
        .with_body(json!({
            "access_token": "issued-token", "token_type": "Bearer",
            "expires_in": 86400, "access_token_token_expired": "2099-01-01 00:00:00"
        }).to_string())
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/uapi/domestic-stock/v1/quotations/chk-holiday")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer issued-token")
        .with_status(200)
        .with_body(json!({"rt_cd": "0", "output": [{"bzdy_yn": "Y"}]}).to_string())
        .expect(2)
        .create_async()
        .await;

    let config = KisConfig::new("key", "secret", "12345678-01", KisAccountType::RealGeneral)
        .with_base_url(server.url());
    let client = KisKrClient::new(KisOAuth::new(config).unwrap()).unwrap();

    assert!(!client.is_holiday(date(2024, 1, 2)).await.unwrap());
    assert!(!client.is_holiday(date(2024, 1, 3)).await.unwrap());
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_token_requests_issue_once() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/oauth2/tokenP")
        .with_status(200)
        .with_body(json!({
            "access_token": "shared-token", "token_type": "Bearer",
            "expires_in": 86400, "access_token_token_expired": "2099-01-01 00:00:00"
        }).to_string())
        .expect(1)
        .create_async()
        .await;

    let config = KisConfig::new("key", "secret", "12345678-01", KisAccountType::RealGeneral)
        .with_base_url(server.url());
    let oauth = KisOAuth::new(config).unwrap();

    let (a, b, c, d) = tokio::join!(
        oauth.get_token(),
        oauth.get_token(),
        oauth.get_token(),
        oauth.get_token()
    );

    for token in [a, b, c, d] {
        assert_eq!(token.unwrap().access_token, "shared-token");
    }
    token_mock.assert_async().await;
}

#[tokio::test]
async fn test_token_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/oauth2/tokenP")
        .with_status(403)
        .with_body(json!({"error_code": "EGW00103", "error_description": "유효하지 않은 AppKey입니다."}).to_string())
        .create_async()
        .await;

    let config = KisConfig::new("bad", "bad", "12345678-01", KisAccountType::RealGeneral)
        .with_base_url(server.url());
    let client = KisKrClient::new(KisOAuth::new(config).unwrap()).unwrap();

    let err = client.get_stock_balance().await.unwrap_err();
    assert!(err.is_auth_error());
}
