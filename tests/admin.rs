//! Integration tests for the admin surface: runtime registration,
//! unregistration, and health reporting.

use std::net::SocketAddr;
use std::time::Duration;

use edge_gateway::config::{GatewayConfig, RouteRuleConfig, ServiceConfig};
use edge_gateway::http::HttpServer;
use edge_gateway::lifecycle::Shutdown;
use edge_gateway::registry::service::RouteMethod;
use serde_json::json;

mod common;

const API_KEY: &str = "admin-test-key";

fn gateway_config(proxy_addr: SocketAddr, admin_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.auth.jwt_secret = "admin-test-secret".to_string();
    config.timeouts.forward_ms = 1000;
    config.health_check.enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = API_KEY.to_string();
    config.admin.bind_address = admin_addr.to_string();
    config
}

async fn spawn_gateway(config: GatewayConfig, proxy_addr: SocketAddr) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let listener = tokio::net::TcpListener::bind(proxy_addr).await.unwrap();
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn admin_requires_api_key() {
    let proxy_addr: SocketAddr = "127.0.0.1:28411".parse().unwrap();
    let admin_addr: SocketAddr = "127.0.0.1:28412".parse().unwrap();

    let shutdown = spawn_gateway(gateway_config(proxy_addr, admin_addr), proxy_addr).await;

    let client = client();
    let url = format!("http://{}/admin/services", admin_addr);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(&url)
        .header("authorization", "Bearer wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let res = client
        .get(&url)
        .header("authorization", format!("Bearer {}", API_KEY))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn runtime_registration_changes_routing() {
    let backend_addr: SocketAddr = "127.0.0.1:28421".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28422".parse().unwrap();
    let admin_addr: SocketAddr = "127.0.0.1:28423".parse().unwrap();

    common::start_mock_backend(backend_addr, "late-arrival").await;

    let shutdown = spawn_gateway(gateway_config(proxy_addr, admin_addr), proxy_addr).await;

    let client = client();
    let ingress_url = format!("http://{}/late-service/ping", proxy_addr);

    // Nothing registered yet.
    let res = client.get(&ingress_url).send().await.unwrap();
    assert_eq!(res.status(), 404);

    // Register at runtime.
    let registration = ServiceConfig {
        name: "late".to_string(),
        url: format!("http://{}", backend_addr),
        prefix: "/late-service".to_string(),
        routes: vec![RouteRuleConfig {
            path: "/ping".to_string(),
            method: RouteMethod::Get,
            roles: vec!["PUBLIC".to_string()],
        }],
        default_roles: None,
        health_check_path: None,
    };
    let res = client
        .post(format!("http://{}/admin/services", admin_addr))
        .header("authorization", format!("Bearer {}", API_KEY))
        .json(&registration)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: serde_json::Value = res.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let res = client.get(&ingress_url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "late-arrival");

    // Reporting the service unhealthy removes it from resolution.
    let res = client
        .put(format!("http://{}/admin/services/{}/health", admin_addr, id))
        .header("authorization", format!("Bearer {}", API_KEY))
        .json(&json!({ "status": "UNHEALTHY" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let res = client.get(&ingress_url).send().await.unwrap();
    assert_eq!(res.status(), 404);

    // Healthy again, then unregister for good.
    let res = client
        .put(format!("http://{}/admin/services/{}/health", admin_addr, id))
        .header("authorization", format!("Bearer {}", API_KEY))
        .json(&json!({ "status": "HEALTHY" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let res = client
        .delete(format!("http://{}/admin/services/{}", admin_addr, id))
        .header("authorization", format!("Bearer {}", API_KEY))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let res = client.get(&ingress_url).send().await.unwrap();
    assert_eq!(res.status(), 404);

    // Deleting twice reports the id as gone.
    let res = client
        .delete(format!("http://{}/admin/services/{}", admin_addr, id))
        .header("authorization", format!("Bearer {}", API_KEY))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.trigger();
}
