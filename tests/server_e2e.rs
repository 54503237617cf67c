//! End-to-end tests through the axum transport adapter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use state_chain::config::SiteConfig;
use state_chain::server::{self, demo_handler, AppState};
use state_chain::site::Site;
use state_chain::steps;

async fn start_server(addr: SocketAddr, config: SiteConfig) {
    let site = Arc::new(Site::new(config));
    let chain = Arc::new(steps::default_chain(demo_handler()));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let _ = server::run(AppState { site, chain }, listener).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
}

fn test_config() -> SiteConfig {
    SiteConfig {
        // Empty canonical host disables host enforcement; the scheme stays
        // "http" so plain test requests pass canonicalization.
        canonical_host: String::new(),
        canonical_scheme: "http".into(),
        ..SiteConfig::default()
    }
}

#[tokio::test]
async fn proxied_request_round_trips() {
    let addr: SocketAddr = "127.0.0.1:28481".parse().unwrap();
    start_server(addr, test_config()).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/hello", addr))
        .header("Cf-Connecting-Ip", "203.0.113.9")
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Hello from /hello\n");
}

#[tokio::test]
async fn direct_request_is_rejected() {
    let addr: SocketAddr = "127.0.0.1:28482".parse().unwrap();
    start_server(addr, test_config()).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/hello", addr))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 403);
    assert_eq!(res.text().await.unwrap(), "The request bypassed a proxy.");
}

#[tokio::test]
async fn save_as_round_trips_through_the_transport() {
    let addr: SocketAddr = "127.0.0.1:28483".parse().unwrap();
    start_server(addr, test_config()).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/report?save_as=report.csv", addr))
        .header("Cf-Connecting-Ip", "203.0.113.9")
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename*=UTF-8''report.csv")
    );
}
