//! Drives a served agent with the typed client over real directories.

use galera_agent::{RouterOptions, router};
use galera_agent_client::{BootstrapSeed, Client};
use galera_agent_core::galera::{
    BOOTSTRAP_FILE, BOOTSTRAP_FILE_NAME, GALERA_STATE_FILE_NAME, RECOVERY_FILE_NAME,
    RECOVERY_LOG_FILE_NAME,
};
use galera_agent_core::{
    Agent, AgentOptions, FileManager, RecoveryOptions, ReloadOptions, Reloader, Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

const GRASTATE: &str = "# GALERA saved state
version: 2.1
uuid:    9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a
seqno:   -1
safe_to_bootstrap: 0
";

const RECOVERY_LOG: &str = "\
2024-05-02 10:41:06 0 [Note] Starting MariaDB 10.11.7-MariaDB-1:10.11.7+maria~ubu2204 as process 1
2024-05-02 10:41:07 0 [Note] InnoDB: 128 rollback segments are active.
2024-05-02 10:41:07 0 [Note] WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:42
";

struct TestAgent {
    client: Client,
    config_dir: TempDir,
    state_dir: TempDir,
}

impl TestAgent {
    fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir.path().join(name)
    }

    fn state_file(&self, name: &str) -> PathBuf {
        self.state_dir.path().join(name)
    }
}

/// Engine stand-in: on restart, writes the recovery log when the recovery
/// directive is installed
fn engine(config_dir: &Path, state_dir: &Path) -> Arc<dyn Reloader> {
    let directive = config_dir.join(RECOVERY_FILE_NAME);
    let log = state_dir.join(RECOVERY_LOG_FILE_NAME);
    Arc::new(move || -> Result<()> {
        if directive.exists() {
            std::fs::write(&log, RECOVERY_LOG)?;
        }
        Ok(())
    })
}

async fn spawn_agent() -> TestAgent {
    let config_dir = tempfile::tempdir().unwrap();
    let state_dir = tempfile::tempdir().unwrap();

    let file_manager = FileManager::new(config_dir.path(), state_dir.path()).unwrap();
    let fast = ReloadOptions {
        retries: 2,
        wait: Duration::from_millis(10),
    };
    let agent = Arc::new(Agent::new(
        Arc::new(file_manager),
        engine(config_dir.path(), state_dir.path()),
        AgentOptions {
            bootstrap_reload: fast.clone(),
            recovery_reload: fast,
            recovery: RecoveryOptions {
                retries: 5,
                wait: Duration::from_millis(20),
            },
        },
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(agent, RouterOptions::default());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestAgent {
        client: Client::new(format!("http://{addr}")).unwrap(),
        config_dir,
        state_dir,
    }
}

#[tokio::test]
async fn test_galera_state_not_found() {
    let agent = spawn_agent().await;
    let err = agent.client.galera_state().get().await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn test_recover_then_bootstrap() {
    let agent = spawn_agent().await;
    std::fs::write(agent.state_file(GALERA_STATE_FILE_NAME), GRASTATE).unwrap();

    let state = agent.client.galera_state().get().await.unwrap();
    assert_eq!(state.sequence_number, -1);
    assert!(!state.safe_to_bootstrap);

    let position = agent.client.recovery().start().await.unwrap();
    assert_eq!(position.cluster_uuid, "9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a");
    assert_eq!(position.sequence_number, 42);
    assert!(!agent.config_file(RECOVERY_FILE_NAME).exists());

    agent
        .client
        .bootstrap()
        .enable(&BootstrapSeed::from(position))
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(agent.config_file(BOOTSTRAP_FILE_NAME)).unwrap(),
        BOOTSTRAP_FILE
    );

    let state = agent.client.galera_state().get().await.unwrap();
    assert_eq!(state.format_version, "2.1");
    assert_eq!(state.sequence_number, 42);
    assert!(state.safe_to_bootstrap);

    agent.client.bootstrap().disable().await.unwrap();
    assert!(!agent.config_file(BOOTSTRAP_FILE_NAME).exists());

    let err = agent.client.bootstrap().disable().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_bootstrap_errors() {
    let agent = spawn_agent().await;

    let err = agent
        .client
        .bootstrap()
        .enable(&BootstrapSeed::new("abc", 5))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(412));

    std::fs::write(agent.state_file(GALERA_STATE_FILE_NAME), GRASTATE).unwrap();
    let err = agent
        .client
        .bootstrap()
        .enable(&BootstrapSeed::new("", 5))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(!agent.config_file(BOOTSTRAP_FILE_NAME).exists());
}

#[tokio::test]
async fn test_stop_recovery() {
    let agent = spawn_agent().await;

    let err = agent.client.recovery().stop().await.unwrap_err();
    assert!(err.is_not_found());

    std::fs::write(agent.config_file(RECOVERY_FILE_NAME), "[galera]\n").unwrap();
    agent.client.recovery().stop().await.unwrap();
    assert!(!agent.config_file(RECOVERY_FILE_NAME).exists());
}
