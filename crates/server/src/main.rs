use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use jsonwebtoken::EncodingKey;
use kube::Client;
use maas_server::api::AppState;
use maas_server::auth::{ApiKeyService, InMemoryApiKeyStore};
use maas_server::cache::Caches;
use maas_server::config::AppConfig;
use maas_server::{api, probe, telemetry};
use tracing::info;

/// CLI flags override `maas.toml`, following `acteon-server::main`'s `Cli`
/// struct (spec.md §6).
#[derive(Debug, Parser)]
#[command(name = "maas-server", version, about = "MaaS gateway control plane HTTP API")]
struct Cli {
    #[arg(long, default_value = "maas.toml")]
    config: PathBuf,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "config_load_failed");
            return std::process::ExitCode::from(2);
        }
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(namespace) = cli.namespace {
        config.server.namespace = namespace;
    }

    match run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "maas_server_fatal");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    api::prometheus::init();

    let client = Client::try_default().await?;
    let caches = Caches::start(client, &config.server.namespace).await;

    let signing_secret = resolve_signing_secret(&config.auth.token_signing_secret);
    let token_signing_key = Arc::new(EncodingKey::from_secret(signing_secret.as_bytes()));

    let state = AppState {
        caches,
        api_keys: Arc::new(ApiKeyService::new(Arc::new(InMemoryApiKeyStore::new()))),
        probe_client: probe::build_client(config.probe.verify_tls),
        token_signing_key,
    };

    let router = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr, namespace = %config.server.namespace, "maas-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_seconds))
        .await?;

    info!("maas-server stopped");
    Ok(())
}

/// Decrypts `ENC[AES256-GCM,...]`-wrapped config secrets via `maas-crypto`
/// if `MAAS_MASTER_KEY` is set and the value is wrapped; otherwise the
/// value is used verbatim (dev convenience, following
/// `acteon-server::config`'s optional-encryption pattern).
fn resolve_signing_secret(raw: &str) -> String {
    if !maas_crypto::is_encrypted(raw) {
        return raw.to_owned();
    }
    let Ok(master_key_raw) = std::env::var("MAAS_MASTER_KEY") else {
        tracing::warn!("token_signing_secret is encrypted but MAAS_MASTER_KEY is unset; using raw value");
        return raw.to_owned();
    };
    match maas_crypto::parse_master_key(&master_key_raw).and_then(|key| maas_crypto::decrypt_value(raw, &key)) {
        Ok(secret) => {
            use maas_crypto::ExposeSecret;
            secret.expose_secret().to_owned()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to decrypt token_signing_secret, falling back to raw value");
            raw.to_owned()
        }
    }
}

async fn shutdown_signal(grace_period_seconds: u64) {
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
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!(grace_period_seconds, "shutdown signal received, draining in-flight requests");
    tokio::time::sleep(std::time::Duration::from_secs(grace_period_seconds.min(5))).await;
}
