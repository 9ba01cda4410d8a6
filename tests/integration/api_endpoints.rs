//! HTTP endpoint tests against a server on an ephemeral port

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use heimdall::{
    Watcher,
    api::{ApiConfig, ApiState, spawn_api_server},
};
use serde_json::{Value, json};
use tempfile::tempdir;

use super::helpers::{PRIMARY, memory_watcher, start_scripted};

async fn spawn_test_api(watcher: Watcher) -> SocketAddr {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: true,
        static_dir: PathBuf::from("static"),
    };

    spawn_api_server(config, ApiState::new(watcher, 9000))
        .await
        .unwrap()
}

async fn get_json(addr: SocketAddr, path: &str) -> (StatusCode, Value) {
    let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

async fn post_config(addr: SocketAddr, body: String) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/config"))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_status_is_unknown_before_first_cycle() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let addr = spawn_test_api(watcher).await;

    let (status, json) = get_json(addr, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "up": null,
            "last_check": null,
            "last_change": null,
            "current_downtime": null,
            "last_sample": null,
        })
    );
}

#[tokio::test]
async fn test_status_reports_open_downtime() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    start_scripted(&watcher, &[true, false]).await;
    let down = watcher.check_now().await.unwrap();
    let addr = spawn_test_api(watcher).await;

    let (_, json) = get_json(addr, "/api/status").await;

    assert_eq!(json["up"], json!(false));
    assert!(json["last_check"].is_string());
    assert_eq!(json["current_downtime"]["ended_at"], Value::Null);
    let started: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(json["current_downtime"]["started_at"].clone()).unwrap();
    assert_eq!(started, down.at);
    assert_eq!(json["last_sample"]["up"], json!(false));
}

#[tokio::test]
async fn test_stats_without_samples() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let addr = spawn_test_api(watcher).await;

    let (status, json) = get_json(addr, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({"uptime_pct": null, "samples": 0, "downtime_seconds": null})
    );
}

#[tokio::test]
async fn test_downtimes_limit() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    start_scripted(&watcher, &[true, false, true, false, true]).await;
    for _ in 0..4 {
        watcher.check_now().await.unwrap();
    }
    let addr = spawn_test_api(watcher).await;

    let (_, all) = get_json(addr, "/api/downtimes").await;
    assert_eq!(all["downtimes"].as_array().unwrap().len(), 2);

    let (_, one) = get_json(addr, "/api/downtimes?limit=1").await;
    let rows = one["downtimes"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], all["downtimes"][0]["id"]);

    let (status, err) = get_json(addr, "/api/downtimes?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "limit must be >= 1.");

    let (status, err) = get_json(addr, "/api/downtimes?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "limit must be an integer.");
}

#[tokio::test]
async fn test_config_round_trip() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let addr = spawn_test_api(watcher).await;

    let (_, before) = get_json(addr, "/api/config").await;
    assert_eq!(before["ping_target"], PRIMARY);

    let (status, updated) = post_config(
        addr,
        json!({"ping_targets": ["1.1.1.1", "8.8.8.8"], "poll_interval": 20, "ping_timeout": 4})
            .to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["ping_targets"], json!(["1.1.1.1", "8.8.8.8"]));
    assert_eq!(updated["ping_target"], "1.1.1.1");

    let (_, after) = get_json(addr, "/api/config").await;
    assert_eq!(after, updated);
}

#[tokio::test]
async fn test_config_rejections() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let addr = spawn_test_api(watcher).await;
    let (_, before) = get_json(addr, "/api/config").await;

    let (status, err) = post_config(addr, "not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Expected JSON body.");

    let (status, err) = post_config(addr, json!([1]).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "JSON body must be an object.");

    let (status, err) = post_config(addr, json!({"poll_interval": 0}).to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "poll_interval must be >= 1.");

    let (_, after) = get_json(addr, "/api/config").await;
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_info_and_health() {
    let dir = tempdir().unwrap();
    let (watcher, _) = memory_watcher(dir.path());
    let addr = spawn_test_api(watcher).await;

    let (_, info) = get_json(addr, "/api/info").await;
    assert_eq!(info["ping_target"], PRIMARY);
    assert_eq!(info["port"], 9000);
    assert!(info["lan_ip"].as_str().unwrap().parse::<std::net::IpAddr>().is_ok());

    let (status, health) = get_json(addr, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["storage"]["healthy"], true);
}
