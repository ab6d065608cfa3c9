//! CLI integration tests for the jit command-line interface.
//!
//! Every test points `JIT_CONFIG_DIR` and `JIT_CACHE_DIR` at temporary
//! directories so nothing touches the real user config or cache. Tests that
//! need a broker run one on `wiremock`.

use std::path::Path;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use jit_store::{CacheKey, Store, StoreConfig};
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Env {
    config: TempDir,
    cache: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            config: TempDir::new().unwrap(),
            cache: TempDir::new().unwrap(),
        }
    }

    /// A `jit` command isolated from the user's config, cache and broker.
    fn jit(&self) -> Command {
        let mut cmd = Command::cargo_bin("jit").unwrap();
        cmd.env("JIT_CONFIG_DIR", self.config.path())
            .env("JIT_CACHE_DIR", self.cache.path())
            .env_remove("JIT_BROKER_URL")
            .env_remove("JIT_TOKEN")
            .current_dir(self.config.path());
        cmd
    }

    fn cache_path(&self) -> &Path {
        self.cache.path()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    Env::new()
        .jit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("just-in-time privilege elevation"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("targets"))
        .stdout(predicate::str::contains("groups"))
        .stdout(predicate::str::contains("elevate"))
        .stdout(predicate::str::contains("revoke"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn test_version_displays() {
    Env::new()
        .jit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jit"));
}

#[test]
fn test_global_flags_accepted() {
    Env::new()
        .jit()
        .args(["--verbose", "--json", "--refresh", "--timeout", "5", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_provider_rejected() {
    Env::new()
        .jit()
        .args(["targets", "--provider", "oracle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown provider 'oracle'"));
}

#[test]
fn test_elevate_requires_role() {
    Env::new()
        .jit()
        .args(["elevate", "--workspace", "111"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--role"));
}

#[test]
fn test_revoke_requires_ids() {
    Env::new().jit().arg("revoke").assert().failure();
}

#[test]
fn test_missing_broker_url() {
    Env::new()
        .jit()
        .arg("targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no broker URL configured"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Maintenance Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_cache_path_honors_env() {
    let env = Env::new();
    env.jit()
        .args(["cache", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.cache_path().to_string_lossy().to_string()));
}

#[test]
fn test_cache_status_and_clear() {
    let env = Env::new();
    {
        let store = Store::open(StoreConfig::new(env.cache_path())).unwrap();
        store
            .set_json(&CacheKey::eligibility("aws"), &serde_json::json!([]))
            .unwrap();
        store
            .record_session_timestamp("sess-1", chrono::Utc::now())
            .unwrap();
    }

    env.jit()
        .args(["--json", "cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entries\": 1"))
        .stdout(predicate::str::contains("\"fresh\": 1"))
        .stdout(predicate::str::contains("\"sessions\": 1"));

    env.jit()
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 cached entry"));

    env.jit()
        .args(["--json", "cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entries\": 0"))
        .stdout(predicate::str::contains("\"sessions\": 1"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Broker Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_targets_cached_across_invocations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/eligibility/aws"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "targets": [{ "workspace_id": "111", "workspace_name": "Sandbox", "role_name": "Admin" }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    let run = move |env: Env, extra: &'static [&'static str]| {
        let uri = uri.clone();
        tokio::task::spawn_blocking(move || {
            env.jit()
                .args(["--json", "--broker", &uri])
                .args(extra)
                .args(["targets", "--provider", "aws"])
                .assert()
                .success()
                .stdout(predicate::str::contains("Sandbox"));
            env
        })
    };

    // First call fetches, second is served from disk, --refresh fetches again.
    let env = run(env, &[]).await.unwrap();
    let env = run(env, &[]).await.unwrap();
    let _env = run(env, &["--refresh"]).await.unwrap();

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_broker_auth_failure_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/eligibility/gcp"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "unauthorized",
            "message": "token expired"
        })))
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        env.jit()
            .args(["--broker", &uri, "targets", "--provider", "gcp"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("token expired"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_queries_providers_concurrently() {
    let server = MockServer::start().await;
    for (provider, group) in [("aws", "Ops"), ("gcp", "Data Admins")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/groups/{provider}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "groups": [{ "group_id": format!("{provider}-1"), "display_name": group }]
                    }))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v1/groups/azure"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({
                    "code": "unavailable",
                    "message": "graph is down"
                }))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    let elapsed = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        env.jit()
            .args(["--json", "--broker", &uri, "groups"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ops"))
            .stdout(predicate::str::contains("Data Admins"))
            .stdout(predicate::str::contains("graph is down"));
        started.elapsed()
    })
    .await
    .unwrap();

    // Three 500ms lookups one after another would take at least 1.5s.
    assert!(elapsed < Duration::from_millis(1400), "groups took {elapsed:?}");
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_fail_when_every_provider_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "internal",
            "message": "broker exploded"
        })))
        .mount(&server)
        .await;

    let env = Env::new();
    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        env.jit()
            .args(["--broker", &uri, "groups"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("all providers failed"));
    })
    .await
    .unwrap();
}
