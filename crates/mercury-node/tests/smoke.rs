//! End-to-end smoke test: spawns the real binary against a live Redis and
//! drives it over HTTP. Gated by `MERCURY_TEST_REDIS_URL` since it needs a
//! reachable Redis instance; `#[ignore]` keeps a hermetic `cargo test` green
//! with no services running.

use std::io::Write;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tempfile::NamedTempFile;

struct NodeGuard(Child);

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("binding an ephemeral port")
        .local_addr()
        .expect("reading local addr")
        .port()
}

async fn wait_for_ready(base: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base}/healthz")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("node never became ready at {base}");
}

fn write_config(redis_url: &str, addr: &str) -> NamedTempFile {
    let (host_port, _) = redis_url
        .trim_start_matches("redis://")
        .split_once('/')
        .unwrap_or((redis_url.trim_start_matches("redis://"), "0"));

    let yaml = format!(
        r#"
server:
  addr: "{addr}"
mercury:
  addr: "{host_port}"
  db: 0
pipeline:
  addr: "{host_port}"
  db: 1
security:
  server_secret: "test-secret-do-not-use-in-production"
quota:
  default_hourly: 100
ldap:
  mock_users_file: null
key_ttl_secs: 300
"#
    );

    let mut file = NamedTempFile::new().expect("creating temp config file");
    file.write_all(yaml.as_bytes()).expect("writing temp config");
    file
}

#[tokio::test]
#[ignore]
async fn bind_then_retrieve_round_trips_a_key() {
    let redis_url = std::env::var("MERCURY_TEST_REDIS_URL")
        .expect("set MERCURY_TEST_REDIS_URL to run this test");

    let port = free_port();
    let addr = format!("127.0.0.1:{port}");
    let base = format!("http://{addr}");

    let config_file = write_config(&redis_url, &addr);

    let child = Command::new(env!("CARGO_BIN_EXE_xzmercury-node"))
        .arg("--config")
        .arg(config_file.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawning xzmercury-node");
    let _guard = NodeGuard(child);

    wait_for_ready(&base).await;

    let client = reqwest::Client::new();

    let bind_resp = client
        .post(format!("{base}/api/keys/bind"))
        .json(&serde_json::json!({
            "package_uuid": "smoke-test-uuid",
            "pipeline_name": "smoke-test-pipeline",
            "caller": "",
        }))
        .send()
        .await
        .expect("sending bind request");
    assert_eq!(bind_resp.status(), 200);

    let bind_body: serde_json::Value = bind_resp.json().await.expect("parsing bind response");
    let key_from_bind = bind_body["key_b64"].as_str().expect("key_b64 present").to_string();

    let retrieve_resp = client
        .post(format!("{base}/api/keys/retrieve"))
        .json(&serde_json::json!({ "package_uuid": "smoke-test-uuid" }))
        .send()
        .await
        .expect("sending retrieve request");
    assert_eq!(retrieve_resp.status(), 200);

    let retrieve_body: serde_json::Value = retrieve_resp.json().await.expect("parsing retrieve response");
    assert_eq!(retrieve_body["key_b64"].as_str().unwrap(), key_from_bind);

    // Second retrieve must 404 — the key was burned on the first read.
    let second = client
        .post(format!("{base}/api/keys/retrieve"))
        .json(&serde_json::json!({ "package_uuid": "smoke-test-uuid" }))
        .send()
        .await
        .expect("sending second retrieve request");
    assert_eq!(second.status(), 404);
}

#[tokio::test]
#[ignore]
async fn readyz_reports_both_stores() {
    let redis_url = std::env::var("MERCURY_TEST_REDIS_URL")
        .expect("set MERCURY_TEST_REDIS_URL to run this test");

    let port = free_port();
    let addr = format!("127.0.0.1:{port}");
    let base = format!("http://{addr}");
    let config_file = write_config(&redis_url, &addr);

    let child = Command::new(env!("CARGO_BIN_EXE_xzmercury-node"))
        .arg("--config")
        .arg(config_file.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawning xzmercury-node");
    let _guard = NodeGuard(child);

    wait_for_ready(&base).await;

    let resp = reqwest::get(format!("{base}/readyz")).await.expect("sending readyz request");
    assert_eq!(resp.status(), 200);
}
