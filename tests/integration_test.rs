use axum::body::Body;
use axum::http::{Request, StatusCode};
use salesplit::api::{self, AppState};
use salesplit::datasource::{CallTraceDeltaComputer, MockDataSource, Trace};
use salesplit::db::init_db;
use salesplit::engine::{AttributionConfig, FeeRecipientSet};
use salesplit::orchestration::{
    Collaborators, Orchestrator, RoyaltyAttributor, TransactionContextAggregator,
};
use salesplit::{Address, Repository, TxHash};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
const OPENSEA_FEE: &str = "0x0000a26b00c1f0df003000390027140000faa719";
const SEAPORT: &str = "0x00000000000000adc04c56bf30ac9d3c0aaf14dc";
const COLLECTION: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
const BUYER: &str = "0xb0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0";
const SELLER: &str = "0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e";
const ROYALTY: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn traced_tx() -> String {
    format!("0x{}", "7e".repeat(32))
}

fn untraced_tx() -> String {
    format!("0x{}", "01".repeat(32))
}

fn sale_trace() -> Trace {
    let transfer_from = format!(
        "0x23b872dd{:0>64}{:0>64}{:064x}",
        &SELLER[2..],
        &BUYER[2..],
        7
    );
    serde_json::from_value(json!({
        "type": "CALL",
        "from": BUYER,
        "to": SEAPORT,
        "value": "0xde0b6b3a7640000",
        "input": "0xfb0f3ee1",
        "calls": [
            { "type": "CALL", "from": SEAPORT, "to": COLLECTION, "input": transfer_from },
            { "type": "CALL", "from": SEAPORT, "to": SELLER, "value": "0xcd64299613c8000", "input": "0x" },
            { "type": "CALL", "from": SEAPORT, "to": ROYALTY, "value": "0xb1a2bc2ec50000", "input": "0x" },
            { "type": "CALL", "from": SEAPORT, "to": OPENSEA_FEE, "value": "0x58d15e17628000", "input": "0x" }
        ]
    }))
    .unwrap()
}

async fn setup_test_app() -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let tx_hash: TxHash = traced_tx().parse().unwrap();
    let traces = Arc::new(MockDataSource::new().with_trace(tx_hash, sale_trace()));
    let wrapped: Address = WETH.parse().unwrap();

    let aggregator = TransactionContextAggregator::new(Collaborators {
        traces,
        fills: repo.clone(),
        balances: Arc::new(CallTraceDeltaComputer::new(wrapped.clone())),
        royalties: repo.clone(),
    });
    let config = AttributionConfig::new(
        FeeRecipientSet::new([OPENSEA_FEE.parse::<Address>().unwrap()]),
        wrapped,
    );
    let orchestrator = Arc::new(Orchestrator::new(
        RoyaltyAttributor::new(aggregator, config),
        repo.clone(),
    ));

    (api::create_router(AppState::new(repo, orchestrator)), temp_dir)
}

fn fill_event(tx_hash: &str, price: &str) -> Value {
    json!({
        "orderKind": "seaport",
        "contract": COLLECTION,
        "tokenId": "7",
        "price": price,
        "baseEventParams": {
            "address": SEAPORT,
            "block": 18000000,
            "txHash": tx_hash,
            "txIndex": 4,
            "logIndex": 2,
            "batchIndex": 0,
            "timestamp": 1693000000
        }
    })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn seed_sale(app: &axum::Router) {
    let (status, body) = send(
        app,
        json_request(
            "PUT",
            &format!("/v1/collections/{}/royalties", COLLECTION),
            json!({ "royalties": [{ "recipient": ROYALTY, "bps": 500 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["royalties"][0]["bps"], 500);

    let mut record = fill_event(&traced_tx(), "1000000000000000000");
    record["variant"] = json!("confirmed");
    let (status, body) = send(app, json_request("POST", "/v1/fills", json!({ "fills": [record] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 1);
    assert_eq!(body["inserted"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = send(&app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = send(&app, get_request("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_attribute_then_fetch_report() {
    let (app, _temp) = setup_test_app().await;
    seed_sale(&app).await;

    let (status, report) = send(
        &app,
        json_request(
            "POST",
            "/v1/royalties/attribute",
            fill_event(&traced_tx(), "1000000000000000000"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["transactionHash"], traced_tx());
    assert_eq!(report["sale"]["tokenId"], "7");
    assert_eq!(report["sale"]["collectionContract"], COLLECTION);
    assert_eq!(report["sale"]["priceInDecimal"], "1");
    assert_eq!(report["royaltyFeeBasisPoints"], 500);
    assert_eq!(report["marketplaceFeeBasisPoints"], 250);
    assert_eq!(report["royaltyFeeBreakdown"], json!([{ "recipient": ROYALTY, "bps": 500 }]));
    assert_eq!(report["marketplaceFeeBreakdown"], json!([{ "recipient": OPENSEA_FEE, "bps": 250 }]));
    assert_eq!(report["possibleMissingRoyalties"], json!([]));
    assert_eq!(report["totalTransfers"], 1);
    assert_eq!(report["sameCollectionSales"], 1);
    assert_eq!(report["paidFullRoyalty"], true);

    let uri = format!(
        "/v1/royalties?txHash={}&contract={}&tokenId=7",
        traced_tx(),
        COLLECTION
    );
    let (status, stored) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored, report);
}

#[tokio::test]
async fn test_stored_report_is_reused() {
    let (app, _temp) = setup_test_app().await;
    seed_sale(&app).await;

    let attribute = || {
        json_request(
            "POST",
            "/v1/royalties/attribute",
            fill_event(&traced_tx(), "1000000000000000000"),
        )
    };
    let (_, first) = send(&app, attribute()).await;

    // Reconfiguring royalties does not change a report that was already produced.
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/v1/collections/{}/royalties", COLLECTION),
            json!({ "royalties": [{ "recipient": SELLER, "bps": 100 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = send(&app, attribute()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_untraced_sale_is_not_found_and_not_stored() {
    let (app, _temp) = setup_test_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/v1/royalties/attribute",
            fill_event(&untraced_tx(), "1000000000000000000"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Trace unavailable"));

    let uri = format!(
        "/v1/royalties?txHash={}&contract={}&tokenId=7",
        untraced_tx(),
        COLLECTION
    );
    let (status, _) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_price_is_bad_request() {
    let (app, _temp) = setup_test_app().await;
    let (status, body) = send(
        &app,
        json_request("POST", "/v1/royalties/attribute", fill_event(&traced_tx(), "0")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_fills_are_ignored() {
    let (app, _temp) = setup_test_app().await;
    seed_sale(&app).await;

    let mut record = fill_event(&traced_tx(), "1000000000000000000");
    record["variant"] = json!("confirmed");
    let (status, body) = send(&app, json_request("POST", "/v1/fills", json!({ "fills": [record] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], 1);
    assert_eq!(body["inserted"], 0);
}

#[tokio::test]
async fn test_royalty_configuration_validation() {
    let (app, _temp) = setup_test_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/v1/collections/not-an-address/royalties",
            json!({ "royalties": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/v1/collections/{}/royalties", COLLECTION),
            json!({ "royalties": [
                { "recipient": ROYALTY, "bps": 6000 },
                { "recipient": SELLER, "bps": 6000 }
            ] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_report_query_rejects_bad_hash() {
    let (app, _temp) = setup_test_app().await;
    let uri = format!("/v1/royalties?txHash=0x1234&contract={}&tokenId=7", COLLECTION);
    let (status, _) = send(&app, get_request(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
