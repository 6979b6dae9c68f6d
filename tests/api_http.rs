// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with a
// scripted upstream transport standing in for the news hosts and EDGAR.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use market_news_proxy::api::{self, AppState, CACHE_NEWS, CACHE_SEC, CACHE_TRADES};
use market_news_proxy::fetch::{HttpReply, ScriptedTransport};
use market_news_proxy::trades::StaticTradeBook;
use market_news_proxy::ProxyConfig;

const BODY_LIMIT: usize = 1024 * 1024;

const CLS_LATEST_1: &str = "https://www.cls.cn/nodeapi/telegraphs?refresh_type=1&rn=10&last_time=0";
const CLS_LATEST_2: &str =
    "https://www.cls.cn/telegraph/api/roll_news?refresh_type=1&rn=10&last_time=0";
const CLS_HOT_1: &str = "https://www.cls.cn/nodeapi/hottelegraphs?rn=10";

fn test_router(transport: ScriptedTransport) -> Router {
    let cfg = ProxyConfig {
        backoff_ms: 0,
        ..ProxyConfig::default()
    };
    let trades = StaticTradeBook::builtin().expect("builtin trades");
    api::router(AppState::new(cfg, Arc::new(transport), Arc::new(trades)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("origin", "https://app.example")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::String(
        String::from_utf8_lossy(&bytes).to_string(),
    ));
    (status, headers, v)
}

fn cache_control(h: &axum::http::HeaderMap) -> &str {
    h.get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, _, body) = get(test_router(ScriptedTransport::new()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Json::String("OK".into()));
}

#[tokio::test]
async fn news_second_endpoint_serves_latest_after_503() {
    let transport = ScriptedTransport::new()
        .reply(CLS_LATEST_1, HttpReply::status(503))
        .json(
            CLS_LATEST_2,
            json!({ "data": { "roll_data": [
                { "id": 1, "content": "hello world", "ctime": 1_700_000_000 }
            ]}}),
        );
    let (status, headers, v) = get(test_router(transport), "/api/news?platform=cailian").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control(&headers), CACHE_NEWS);
    assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    let latest = v["latest"].as_array().expect("latest array");
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0]["id"], "cl_1");
    assert_eq!(latest[0]["content"], "hello world");
    assert_eq!(latest[0]["url"], "https://www.cls.cn/detail/1");
    assert_eq!(latest[0]["time"].as_str().map(str::len), Some(5));

    // hottest had no reachable endpoint: degraded, not failed
    assert_eq!(v["hottest"], json!([]));
    assert!(v["error"].as_str().unwrap_or("").contains("hottest"));
    assert_eq!(v["platform"], "cailian");
}

#[tokio::test]
async fn news_all_endpoints_down_is_still_200() {
    let (status, _, v) = get(
        test_router(ScriptedTransport::new()),
        "/api/news?platform=wallstreetcn",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["latest"], json!([]));
    assert_eq!(v["hottest"], json!([]));
    let err = v["error"].as_str().expect("error message");
    assert!(err.contains("latest") && err.contains("hottest"));
}

#[tokio::test]
async fn news_without_failures_has_no_error_field() {
    let transport = ScriptedTransport::new()
        .json(CLS_LATEST_1, json!({"data": {"roll_data": []}}))
        .json(CLS_HOT_1, json!([{"id": 9, "title": "重大资产重组获批准"}]));
    let (status, _, v) = get(test_router(transport), "/api/news?platform=CAILIAN").await;
    assert_eq!(status, StatusCode::OK);
    assert!(v.get("error").is_none());
    assert_eq!(v["latest"], json!([]));
    assert_eq!(v["hottest"][0]["id"], "cl_9");
    assert_eq!(v["hottest"][0]["readCount"], 0);
}

#[tokio::test]
async fn news_rejects_missing_or_unknown_platform() {
    let (s1, _, v1) = get(test_router(ScriptedTransport::new()), "/api/news").await;
    assert_eq!(s1, StatusCode::BAD_REQUEST);
    assert_eq!(v1["error"], "platform is required");

    let (s2, _, v2) = get(
        test_router(ScriptedTransport::new()),
        "/api/news?platform=bloomberg",
    )
    .await;
    assert_eq!(s2, StatusCode::BAD_REQUEST);
    assert!(v2["error"].as_str().unwrap().contains("bloomberg"));
}

#[tokio::test]
async fn sec_returns_holdings_from_info_table() {
    let folder = "https://www.sec.gov/Archives/edgar/data/1067983/000095012324008740";
    let transport = ScriptedTransport::new()
        .json(
            "https://data.sec.gov/submissions/CIK0001067983.json",
            json!({"filings": {"recent": {
                "form": ["13F-HR"],
                "accessionNumber": ["0000950123-24-008740"]
            }}}),
        )
        .reply(
            &format!("{folder}/form13fInfoTable.xml"),
            HttpReply::ok(
                "<informationTable>\
                 <infoTable><nameOfIssuer>APPLE INC</nameOfIssuer><value>174347</value>\
                 <shrsOrPrnAmt><sshPrnamt>915560382</sshPrnamt><sshPrnamtType>SH</sshPrnamtType></shrsOrPrnAmt></infoTable>\
                 <infoTable><nameOfIssuer>NO VALUE CO</nameOfIssuer>\
                 <shrsOrPrnAmt><sshPrnamt>1</sshPrnamt></shrsOrPrnAmt></infoTable>\
                 </informationTable>",
            ),
        );
    let (status, headers, v) = get(test_router(transport), "/api/sec?cik=1067983").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control(&headers), CACHE_SEC);
    assert_eq!(
        v,
        json!([{
            "nameOfIssuer": "APPLE INC",
            "value": "174347",
            "sshPrnamt": "915560382",
            "sshPrnamtType": "SH"
        }])
    );
}

#[tokio::test]
async fn sec_without_13f_filing_is_500() {
    let transport = ScriptedTransport::new().json(
        "https://data.sec.gov/submissions/CIK0000320193.json",
        json!({"filings": {"recent": {"form": ["10-K", "8-K"], "accessionNumber": ["a", "b"]}}}),
    );
    let (status, _, v) = get(test_router(transport), "/api/sec?cik=320193").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v["error"].as_str().unwrap().contains("13F-HR"));
}

#[tokio::test]
async fn sec_upstream_down_is_500() {
    let (status, _, v) = get(test_router(ScriptedTransport::new()), "/api/sec?cik=42").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v.get("error").is_some());
}

#[tokio::test]
async fn sec_validates_cik() {
    let (s1, _, v1) = get(test_router(ScriptedTransport::new()), "/api/sec").await;
    assert_eq!(s1, StatusCode::BAD_REQUEST);
    assert_eq!(v1["error"], "CIK is required");

    let (s2, _, _) = get(test_router(ScriptedTransport::new()), "/api/sec?cik=abc").await;
    assert_eq!(s2, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sec_without_user_agent_is_misconfigured() {
    let mut cfg = ProxyConfig::default();
    cfg.sec.user_agent = String::new();
    let app = api::router(AppState::new(
        cfg,
        Arc::new(ScriptedTransport::new()),
        Arc::new(StaticTradeBook::default()),
    ));
    let (status, _, v) = get(app, "/api/sec?cik=42").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v["error"].as_str().unwrap().contains("user agent"));
}

#[tokio::test]
async fn trades_lookup_and_errors() {
    let (s1, h1, v1) = get(
        test_router(ScriptedTransport::new()),
        "/api/trades?filer=pelosi,%20nancy",
    )
    .await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(cache_control(&h1), CACHE_TRADES);
    assert_eq!(v1.as_array().map(Vec::len), Some(3));
    assert_eq!(v1[0]["ticker"], "NVDA");

    let (s2, _, v2) = get(
        test_router(ScriptedTransport::new()),
        "/api/trades?filer=nobody",
    )
    .await;
    assert_eq!(s2, StatusCode::NOT_FOUND);
    assert_eq!(v2["error"], "No data found for this filer");

    let (s3, _, _) = get(test_router(ScriptedTransport::new()), "/api/trades").await;
    assert_eq!(s3, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/news?platform=cailian")
        .header("origin", "https://app.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .expect("build request");
    let resp = test_router(ScriptedTransport::new())
        .oneshot(req)
        .await
        .expect("oneshot");

    assert!(resp.status().is_success(), "status {}", resp.status());
    let h = resp.headers();
    assert_eq!(
        h.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("https://app.example")
    );
    let methods = h
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(methods.contains("GET"), "allow-methods: {methods}");
}
