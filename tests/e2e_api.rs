//! E2E tests for the HTTP surface

mod common;

use common::{ALICE, TestServer};
use serde_json::{Value, json};

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_cors_allows_public_site() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", common::BASE_URL)
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        common::BASE_URL
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    banscomms::metrics::init_metrics();
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_lists_configured_backends() {
    let server = TestServer::new().await;

    let body: Value = server
        .client
        .get(server.url("/api/backends"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let names: Vec<&str> = body["backends"]
        .as_array()
        .unwrap()
        .iter()
        .map(|backend| backend["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["iks", "pisex", "zenith", "fresh"]);
    assert_eq!(body["backends"][0]["driver"], json!("iks"));
    assert_eq!(body["backends"][0]["driver_name"], json!("IKSAdmin"));
    assert_eq!(body["backends"][3]["driver"], json!("fresh_bans"));
}

#[tokio::test]
async fn test_columns_endpoint() {
    let server = TestServer::new().await;

    let columns: Value = server
        .client
        .get(server.url("/api/backends/zenith/comms/columns"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let columns = columns.as_array().unwrap();
    assert_eq!(columns.len(), 14);
    assert_eq!(columns[0]["fieldKey"], json!("type"));
    assert_eq!(columns[0]["cellFormatter"]["formatter"], json!("kind_icon"));
    assert_eq!(columns[5]["defaultOrder"], json!(true));
}

#[tokio::test]
async fn test_unknown_backend_is_404() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/backends/nope/bans"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_ban_listing_over_http() {
    let server = TestServer::new().await;

    let body: Value = server
        .client
        .post(server.url("/api/backends/iks/bans"))
        .json(&json!({
            "draw": "3",
            "page": 1,
            "perPage": "2",
            "search": {"value": ""},
            "order": [{"column": "0", "dir": "asc"}]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["draw"], json!(3));
    assert_eq!(body["recordsTotal"], json!(4));
    assert_eq!(body["recordsFiltered"], json!(4));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    // No columns were sent, so the order rule is ignored
    assert_eq!(body["data"][0][4], json!(1700000300));
}

#[tokio::test]
async fn test_server_query_param_scopes_listing() {
    let server = TestServer::new().await;

    let body: Value = server
        .client
        .post(server.url("/api/backends/iks/comms?server=1"))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["recordsTotal"], json!(2));
}

#[tokio::test]
async fn test_player_listing_accepts_any_id_format() {
    let server = TestServer::new().await;

    for id in [ALICE, "STEAM_1:1:19867136", "%5BU:1:39734273%5D"] {
        let body: Value = server
            .client
            .post(server.url(&format!("/api/backends/iks/players/{id}/bans")))
            .json(&json!({}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["recordsTotal"], json!(2), "id {id}");
    }
}

#[tokio::test]
async fn test_unparsable_player_id_gets_empty_page() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/backends/iks/players/not-an-id/comms"))
        .json(&json!({"draw": 9}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"draw": 9, "recordsTotal": 0, "recordsFiltered": 0, "data": []})
    );
}

#[tokio::test]
async fn test_counts_endpoint() {
    let server = TestServer::new().await;

    let body: Value = server
        .client
        .get(server.url("/api/counts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["totals"]["bans"], json!(10));
    assert_eq!(body["totals"]["admins"], json!(4));
    assert_eq!(body["backends"][0]["backend"], json!("iks"));
    assert_eq!(body["backends"][0]["mutes"], json!(2));

    // Every call starts a fresh session
    let again: Value = server
        .client
        .get(server.url("/api/counts?all_servers=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["totals"]["admins"], json!(4));
}
