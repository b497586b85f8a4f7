//! Galera Agent - sidecar for MariaDB Galera nodes
//!
//! Serves the bootstrap/recovery API over the engine's config and state
//! directories.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use galera_agent::{
    KubernetesTokenVerifier, RouterOptions, TokenVerifier, TrustedServiceAccount, router,
};
use galera_agent_core::{
    Agent, AgentOptions, FileManager, ProcessReloader, RecoveryOptions, ReloadOptions,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "galera-agent")]
#[command(about = "Sidecar agent for MariaDB Galera bootstrap and recovery")]
#[command(version)]
struct Args {
    /// Listen address for the HTTP API
    #[arg(short, long, env = "GALERA_AGENT_LISTEN", default_value = "0.0.0.0:5555")]
    listen: String,

    /// Directory holding the engine's config snippets
    #[arg(long, env = "GALERA_AGENT_CONFIG_DIR", default_value = "/etc/mysql/mariadb.conf.d")]
    config_dir: String,

    /// Engine data directory, holding grastate.dat
    #[arg(long, env = "GALERA_AGENT_STATE_DIR", default_value = "/var/lib/mysql")]
    state_dir: String,

    /// HTTP response compression level
    #[arg(long, env = "GALERA_AGENT_COMPRESS_LEVEL", default_value = "5")]
    compress_level: i32,

    /// API requests allowed per rate limit period (0 disables rate limiting)
    #[arg(long, env = "GALERA_AGENT_RATE_LIMIT_REQUESTS", default_value = "0")]
    rate_limit_requests: u64,

    /// Rate limit period in seconds
    #[arg(long, env = "GALERA_AGENT_RATE_LIMIT_DURATION_SECS", default_value = "0")]
    rate_limit_duration_secs: u64,

    /// Authenticate callers with Kubernetes TokenReview
    #[arg(long, env = "GALERA_AGENT_KUBERNETES_AUTH", default_value_t = false)]
    kubernetes_auth: bool,

    /// Name of the ServiceAccount allowed to call the API
    #[arg(long, env = "GALERA_AGENT_KUBERNETES_TRUSTED_NAME")]
    kubernetes_trusted_name: Option<String>,

    /// Namespace of the ServiceAccount allowed to call the API
    #[arg(long, env = "GALERA_AGENT_KUBERNETES_TRUSTED_NAMESPACE")]
    kubernetes_trusted_namespace: Option<String>,

    /// Engine reload attempts when enabling bootstrap
    #[arg(long, env = "GALERA_AGENT_BOOTSTRAP_RELOAD_RETRIES", default_value = "10")]
    bootstrap_reload_retries: u32,

    /// Engine reload attempts when starting recovery
    #[arg(long, env = "GALERA_AGENT_RECOVERY_RELOAD_RETRIES", default_value = "3")]
    recovery_reload_retries: u32,

    /// Wait between engine reload attempts, in milliseconds
    #[arg(long, env = "GALERA_AGENT_RELOAD_WAIT_MS", default_value = "1000")]
    reload_wait_ms: u64,

    /// Recovery log reads before giving up
    #[arg(long, env = "GALERA_AGENT_RECOVERY_RETRIES", default_value = "10")]
    recovery_retries: u32,

    /// Wait before each recovery log read, in milliseconds
    #[arg(long, env = "GALERA_AGENT_RECOVERY_WAIT_MS", default_value = "3000")]
    recovery_wait_ms: u64,

    /// Time allowed for in-flight requests after a shutdown signal, in seconds
    #[arg(long, env = "GALERA_AGENT_GRACEFUL_SHUTDOWN_TIMEOUT_SECS", default_value = "5")]
    graceful_shutdown_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "GALERA_AGENT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, env = "GALERA_AGENT_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    fn agent_options(&self) -> AgentOptions {
        let reload_wait = Duration::from_millis(self.reload_wait_ms);
        AgentOptions {
            bootstrap_reload: ReloadOptions {
                retries: self.bootstrap_reload_retries,
                wait: reload_wait,
            },
            recovery_reload: ReloadOptions {
                retries: self.recovery_reload_retries,
                wait: reload_wait,
            },
            recovery: RecoveryOptions {
                retries: self.recovery_retries,
                wait: Duration::from_millis(self.recovery_wait_ms),
            },
        }
    }
}

fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.log_level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn kubernetes_verifier(args: &Args) -> Result<Arc<dyn TokenVerifier>> {
    let (Some(name), Some(namespace)) = (
        args.kubernetes_trusted_name.as_deref(),
        args.kubernetes_trusted_namespace.as_deref(),
    ) else {
        anyhow::bail!(
            "--kubernetes-trusted-name and --kubernetes-trusted-namespace are required with --kubernetes-auth"
        );
    };

    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let trusted = TrustedServiceAccount::new(name, namespace);
    info!("Kubernetes auth enabled, trusting {}", trusted.username());

    Ok(Arc::new(KubernetesTokenVerifier::new(client, trusted)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    info!("Starting Galera agent");
    info!("Config directory: {}", args.config_dir);
    info!("State directory: {}", args.state_dir);

    let file_manager = FileManager::new(&args.config_dir, &args.state_dir)
        .context("Failed to open engine directories")?;
    let agent = Arc::new(Agent::new(
        Arc::new(file_manager),
        Arc::new(ProcessReloader::new()),
        args.agent_options(),
    ));

    let mut options = RouterOptions::default()
        .with_compress_level(args.compress_level)
        .with_rate_limit(
            args.rate_limit_requests,
            Duration::from_secs(args.rate_limit_duration_secs),
        );
    if let Some((requests, per)) = options.rate_limit {
        info!("Rate limit: {} requests per {:?}", requests, per);
    }
    if args.kubernetes_auth {
        options = options.with_auth(kubernetes_verifier(&args).await?);
    }

    let app = router(agent, options);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", args.listen))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Starting agent API server on {}", addr);

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, app.into_make_service()).with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.notified().await }
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        res = &mut server => {
            res.context("Server error")?;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    info!("Shutting down...");
    shutdown.notify_one();

    let timeout = Duration::from_secs(args.graceful_shutdown_timeout_secs);
    match tokio::time::timeout(timeout, server).await {
        Ok(res) => res.context("Server error")?,
        Err(_) => warn!("Graceful shutdown timed out after {:?}", timeout),
    }

    info!("Agent shut down");
    Ok(())
}
