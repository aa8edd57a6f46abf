use anyhow::Result;
use etfdash::api::{FundQuery, HttpFundApi, LOAD_FUNDS_FAILED};
use etfdash::api::FundApi;
use etfdash::models::{SortBy, SortOrder};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{ASSET_CLASSES_JSON, FUNDS_JSON, SEARCH_JSON, STATS_JSON};

fn client(server: &MockServer) -> HttpFundApi {
    HttpFundApi::new().with_base_url(format!("{}/api", server.uri()))
}

#[tokio::test]
async fn get_funds_sends_sort_and_omits_wildcard_class() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/etfs"))
        .and(query_param("sortBy", "ter_percent"))
        .and(query_param("order", "ASC"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(FUNDS_JSON, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let query = FundQuery {
        sort_by: SortBy::TerPercent,
        order: SortOrder::Asc,
        asset_class: Some("Все".to_string()),
    };
    let funds = api.get_funds(&query).await?;
    assert_eq!(funds.len(), 3);
    assert_eq!(funds[0].ticker, "TMOS");
    assert_eq!(funds[0].price_change_6m, Some(12.5));
    assert_eq!(funds[2].nav_million_rub, None);

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].url.query_pairs().all(|(key, _)| key != "assetClass"),
        "wildcard class must not be sent"
    );

    Ok(())
}

#[tokio::test]
async fn get_funds_forwards_specific_class() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/etfs"))
        .and(query_param("assetClass", "Акции"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEARCH_JSON, "application/json"))
        .mount(&server)
        .await;

    let query = FundQuery {
        asset_class: Some("Акции".to_string()),
        ..FundQuery::default()
    };
    assert_eq!(api.get_funds(&query).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn null_list_is_empty() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "nothing"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("null", "application/json"))
        .mount(&server)
        .await;

    assert!(api.search("nothing").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn server_error_maps_to_load_message() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/etfs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api
        .get_funds(&FundQuery::default())
        .await
        .expect_err("expected failure");
    assert_eq!(err.to_string(), LOAD_FUNDS_FAILED);
    assert_eq!(err.http_status().map(|s| s.as_u16()), Some(500));
    assert!(!err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn get_fund_distinguishes_missing_from_failure() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/etfs/TMOS"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"ticker": "TMOS", "fundName": "Тинькофф Индекс МосБиржи"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/etfs/BROKEN"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fund = api.get_fund("TMOS").await?;
    assert_eq!(fund.fund_name, "Тинькофф Индекс МосБиржи");

    let missing = api.get_fund("NOPE").await.expect_err("expected 404");
    assert!(missing.is_not_found());
    assert_eq!(missing.to_string(), "ETF не найден");

    let broken = api.get_fund("BROKEN").await.expect_err("expected 503");
    assert!(!broken.is_not_found());
    assert_eq!(broken.to_string(), LOAD_FUNDS_FAILED);

    Ok(())
}

#[tokio::test]
async fn stats_and_asset_classes_decode() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(STATS_JSON, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/asset-classes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(ASSET_CLASSES_JSON, "application/json"),
        )
        .mount(&server)
        .await;

    let stats = api.get_stats().await?;
    assert_eq!(stats.unique_tickers, 140);
    assert!((stats.total_nav - 812345.67).abs() < 1e-9);
    assert!((stats.avg_ter - 0.95).abs() < 1e-9);

    let classes = api.get_asset_classes().await?.into_options();
    assert_eq!(classes[0], "Все");
    assert_eq!(classes.len(), 4);

    Ok(())
}

#[tokio::test]
async fn top_by_nav_and_scrape() -> Result<()> {
    let server = MockServer::start().await;
    let api = client(&server);

    Mock::given(method("GET"))
        .and(path("/api/top-by-nav"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEARCH_JSON, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "started", "message": "Scraping started"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(api.top_by_nav(5).await?.len(), 1);

    let ack = api.start_scraping().await?;
    assert_eq!(ack.status, "started");

    Ok(())
}
