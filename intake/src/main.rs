use clap::Parser;
use std::process::Stdio;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake::api::{create_router, AppState};
use intake::config::Config;
use intake::db::{CatalogBackend, Database, LibSqlCatalog};
use intake::llm::LlmProvider;
use intake::ocr::OcrProvider;
use intake::storage::{BlobStore, CacheFs, S3BlobStore};
use intake::transcription::TranscriptionProvider;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Legal-document case intake pipeline")]
struct Args {
    /// Runtime mode: all, api, or worker
    #[arg(long)]
    mode: Option<String>,

    /// Run API and workers in one process when mode=all
    #[arg(long)]
    single_process: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuntimeMode {
    All,
    Api,
    Worker,
}

impl RuntimeMode {
    fn parse(raw: Option<&str>) -> Self {
        let value = raw
            .map(std::string::ToString::to_string)
            .or_else(|| std::env::var("INTAKE_RUNTIME_MODE").ok())
            .map(|v| v.trim().to_lowercase());

        match value.as_deref() {
            Some("api") => Self::Api,
            Some("worker") => Self::Worker,
            Some("all") | None => Self::All,
            Some(other) => {
                tracing::warn!(
                    value = %other,
                    "Invalid INTAKE_RUNTIME_MODE/--mode; falling back to 'all'"
                );
                Self::All
            }
        }
    }

    fn runs_api(self) -> bool {
        matches!(self, Self::All | Self::Api)
    }

    fn runs_worker(self) -> bool {
        matches!(self, Self::All | Self::Worker)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Api => "api",
            Self::Worker => "worker",
        }
    }
}

fn parse_env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    error = %error,
                    "Invalid numeric env value; using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    "Invalid boolean env value; using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn should_supervise_subprocesses(runtime_mode: RuntimeMode, single_process: bool) -> bool {
    matches!(runtime_mode, RuntimeMode::All) && !single_process
}

fn build_child_command(executable: &std::path::Path, mode: RuntimeMode) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(executable);
    command
        .arg("--mode")
        .arg(mode.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    command
}

async fn terminate_child(name: &str, child: &mut tokio::process::Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            tracing::info!(process = name, %status, "Subprocess already exited");
            return;
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(process = name, error = %error, "Failed to inspect subprocess state");
        }
    }

    match child.kill().await {
        Ok(()) => tracing::info!(process = name, "Subprocess terminated"),
        Err(error) => {
            tracing::warn!(process = name, error = %error, "Failed to terminate subprocess")
        }
    }
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
}

async fn run_subprocess_supervisor() -> anyhow::Result<()> {
    let executable = std::env::current_exe()?;
    tracing::info!(path = %executable.display(), "Starting all-mode subprocess supervisor");

    let mut api_child = build_child_command(&executable, RuntimeMode::Api).spawn()?;
    let mut worker_child = build_child_command(&executable, RuntimeMode::Worker).spawn()?;

    tracing::info!(pid = api_child.id(), "Spawned API subprocess");
    tracing::info!(pid = worker_child.id(), "Spawned worker subprocess");

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            tracing::info!("Shutdown signal received, terminating subprocesses...");
            terminate_child("api", &mut api_child).await;
            terminate_child("worker", &mut worker_child).await;
            Ok(())
        }
        status = api_child.wait() => {
            let status = status?;
            tracing::error!(%status, "API subprocess exited unexpectedly");
            terminate_child("worker", &mut worker_child).await;
            Err(anyhow::anyhow!("API subprocess exited unexpectedly: {status}"))
        }
        status = worker_child.wait() => {
            let status = status?;
            tracing::error!(%status, "Worker subprocess exited unexpectedly");
            terminate_child("api", &mut api_child).await;
            Err(anyhow::anyhow!("Worker subprocess exited unexpectedly: {status}"))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime_mode = RuntimeMode::parse(args.mode.as_deref());
    let single_process = args.single_process || parse_env_bool("INTAKE_SINGLE_PROCESS", false);

    tracing::info!(mode = runtime_mode.as_str(), single_process, "Runtime mode selected");

    if should_supervise_subprocesses(runtime_mode, single_process) {
        return run_subprocess_supervisor().await;
    }

    if matches!(runtime_mode, RuntimeMode::All) && single_process {
        tracing::info!("Single-process all-mode enabled");
    }

    let config = Config::from_env();

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "INTAKE_API_KEYS is not set — the API is locked. Set INTAKE_API_KEYS to enable access."
        );
    }

    tracing::info!("Initializing catalog database...");
    let db = Database::new(&config.database).await?;
    let catalog: Arc<dyn CatalogBackend> = Arc::new(LibSqlCatalog::new(db));

    tracing::info!(bucket = %config.blob_store.bucket, "Initializing blob store...");
    let blob_store: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(&config.blob_store).await);

    let cache_fs = Arc::new(CacheFs::new(&config.cache_fs));

    tracing::info!("Initializing OCR provider: {}...", config.ocr.model);
    let ocr = OcrProvider::new(&config.ocr)?;
    if !ocr.is_available() {
        tracing::warn!("OCR unavailable - image extraction will be skipped");
    }

    tracing::info!("Initializing transcription provider: {}...", config.transcription.model);
    let transcription = TranscriptionProvider::new(&config.transcription)?;
    if !transcription.is_available() {
        tracing::warn!("Transcription unavailable - audio extraction will be skipped");
    }

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - analysis and summary generation will be disabled");
    }

    let state = AppState::new(config.clone(), catalog, blob_store, cache_fs, ocr, transcription, llm);

    let cancel_token = CancellationToken::new();

    if runtime_mode.runs_worker() {
        tracing::info!(
            interval_secs = state.config.pipeline.poll_interval_secs,
            "Starting pipeline coordinator sweep loop"
        );
        state.coordinator.clone().spawn_sweep_loop();
    } else {
        tracing::info!("Worker tasks disabled in API-only mode");
    }

    if runtime_mode.runs_api() {
        let sync_interval_secs = parse_env_u64("DATABASE_SYNC_INTERVAL_SECS", 30).max(1);
        tracing::info!(interval_secs = sync_interval_secs, "Starting catalog sync loop");
        let catalog = state.catalog.clone();
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Catalog sync loop shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(tokio::time::Duration::from_secs(sync_interval_secs)) => {
                        if let Err(e) = catalog.sync().await {
                            tracing::warn!(error = %e, "Catalog sync failed");
                        }
                    }
                }
            }
        });

        let app = create_router(state);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        tracing::info!("intake starting on http://{}", addr);
        tracing::info!("  Health check: http://{}/api/v1/health", addr);
        tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
        tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(cancel_token))
            .await?;

        return Ok(());
    }

    tracing::info!("Worker mode active; HTTP server disabled");
    shutdown_signal(cancel_token).await;
    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    wait_for_shutdown_signal().await;
    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_mode_parse_values() {
        assert_eq!(RuntimeMode::parse(Some("all")), RuntimeMode::All);
        assert_eq!(RuntimeMode::parse(Some("api")), RuntimeMode::Api);
        assert_eq!(RuntimeMode::parse(Some("worker")), RuntimeMode::Worker);
        assert_eq!(RuntimeMode::parse(Some("unknown")), RuntimeMode::All);
    }

    #[test]
    fn should_supervise_only_when_all_and_not_single_process() {
        assert!(should_supervise_subprocesses(RuntimeMode::All, false));
        assert!(!should_supervise_subprocesses(RuntimeMode::All, true));
        assert!(!should_supervise_subprocesses(RuntimeMode::Api, false));
        assert!(!should_supervise_subprocesses(RuntimeMode::Worker, false));
    }

    #[test]
    fn parse_env_bool_handles_supported_values() {
        assert!(parse_env_bool_from_raw("true", false));
        assert!(parse_env_bool_from_raw("1", false));
        assert!(parse_env_bool_from_raw("yes", false));
        assert!(!parse_env_bool_from_raw("false", true));
        assert!(!parse_env_bool_from_raw("0", true));
        assert!(!parse_env_bool_from_raw("no", true));
        assert!(parse_env_bool_from_raw("invalid", true));
        assert!(!parse_env_bool_from_raw("invalid", false));
    }

    fn parse_env_bool_from_raw(raw: &str, default: bool) -> bool {
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        }
    }
}
