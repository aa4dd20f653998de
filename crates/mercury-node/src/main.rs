//! xzmercury-node — the key-issuance service binary.
//!
//! Startup sequence:
//!   1. Refuse to run with elevated privileges (before anything else opens)
//!   2. Load configuration
//!   3. Initialise tracing
//!   4. Connect to both Redis stores
//!   5. Build the directory client, ACL table, and admission pipeline
//!   6. Serve HTTP with graceful shutdown

mod privilege;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mercury_acl::PolicyTable;
use mercury_api::{router, AdmissionPipeline, AppState, Metrics};
use mercury_core::MercuryConfig;
use mercury_directory::{DirectoryCache, DirectoryClient, LdapDirectoryClient, MockDirectoryClient};
use mercury_quota::QuotaManager;
use mercury_store::KeyStore;
use mercury_tracker::Tracker;
use redis::aio::ConnectionManager;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "xzmercury-node",
    version,
    about = "xzmercury — short-lived symmetric-key issuance for export pipelines"
)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must come before tracing init and before any socket is opened.
    privilege::refuse_elevated_privileges().context("privilege guard")?;

    let args = Args::parse();
    let config = MercuryConfig::load(&args.config).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,xzmercury=debug".parse().unwrap()),
        )
        .init();

    info!("xzmercury starting");

    let server_secret = config.security.resolve_server_secret().context("resolving server secret")?;

    let mercury_redis = connect_redis(&config.mercury, "mercury").await?;
    let pipeline_redis = connect_redis(&config.pipeline, "pipeline").await?;

    let directory = build_directory_client(&config, pipeline_redis.clone())
        .context("building directory client")?;

    // The ACL table's group/cost policy lives under `quota.acl_file`, not
    // `ldap.acl_file` — group+cost is quota's domain, not the directory's.
    // See DESIGN.md.
    let policy = match &config.quota.acl_file {
        Some(path) if !path.is_empty() => {
            PolicyTable::load(&PathBuf::from(path)).context("loading ACL/policy table")?
        }
        _ => {
            info!("no quota.acl_file configured — using a permissive default policy");
            PolicyTable::permissive()
        }
    };

    let keys = KeyStore::new(mercury_redis.clone());
    let quota = QuotaManager::new(pipeline_redis.clone(), config.quota.default_hourly);
    let tracker = Tracker::new(pipeline_redis.clone());

    let pipeline = AdmissionPipeline::new(
        directory,
        policy,
        keys,
        quota,
        tracker,
        server_secret,
        config.key_ttl_secs,
    );

    let state = Arc::new(AppState {
        pipeline,
        metrics: Metrics::new(),
        mercury_redis,
        pipeline_redis,
    });

    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);
    let app = router(state, request_timeout);

    let addr = normalize_addr(&config.server.addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "xzmercury ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn connect_redis(cfg: &mercury_core::config::RedisConfig, label: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(cfg.connection_url())
        .with_context(|| format!("building {label} redis client"))?;
    let conn = ConnectionManager::new(client)
        .await
        .with_context(|| format!("connecting to {label} redis"))?;
    info!(store = label, "connected to redis");
    Ok(conn)
}

fn build_directory_client(
    config: &MercuryConfig,
    pipeline_redis: ConnectionManager,
) -> anyhow::Result<Arc<dyn DirectoryClient>> {
    let ldap = &config.ldap;

    let inner: Arc<dyn DirectoryClient> = if let Some(users_file) = &ldap.mock_users_file {
        info!(file = %users_file, "using mock directory client");
        Arc::new(MockDirectoryClient::from_file(&PathBuf::from(users_file))?)
    } else {
        let addr = ldap.addr.clone().context("ldap.addr is required when ldap.mock_users_file is unset")?;
        let bind_dn = ldap.bind_dn.clone().unwrap_or_default();
        let bind_password = ldap.bind_password.clone().unwrap_or_default();
        let base_dn = ldap.base_dn.clone().unwrap_or_default();
        info!(%addr, "using LDAP directory client");
        Arc::new(LdapDirectoryClient::new(addr, bind_dn, bind_password, base_dn))
    };

    // Wrapping a trait object in the cache would need `DirectoryCache<dyn
    // DirectoryClient>`, which isn't sized; instead the cache wraps a small
    // adapter that forwards to the already-built `Arc<dyn DirectoryClient>`.
    struct Forwarding(Arc<dyn DirectoryClient>);

    #[async_trait::async_trait]
    impl DirectoryClient for Forwarding {
        async fn is_member(&self, user: &str, group: &str) -> Result<bool, mercury_core::MercuryError> {
            self.0.is_member(user, group).await
        }
    }

    let cached = DirectoryCache::new(Arc::new(Forwarding(inner)), pipeline_redis, ldap.cache_ttl_secs);
    Ok(Arc::new(cached))
}

fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
}
