//! toastyd - The toasty background service
//!
//! This is the main entry point for the toastyd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - Bed actuator (command driver or mock)
//! - Core engine
//! - IPC server

mod respond;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use toasty_api::{Command, Response, ResponsePayload, DEFAULT_RECENT_SESSIONS_LIMIT};
use toasty_config::{load_config, ConfigError, DriverConfig, Policy};
use toasty_core::{CoreEngine, TokioExecutor};
use toasty_host_api::{BedActuator, MockActuator};
use toasty_host_linux::CommandActuator;
use toasty_ipc::{IpcServer, ServerMessage};
use toasty_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use toasty_util::{default_config_path, is_mock_time_active};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// toastyd - Tanning bed admission and control service
#[derive(Parser, Debug)]
#[command(name = "toastyd")]
#[command(about = "Tanning bed admission and control service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/toasty/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set TOASTY_SOCKET env var)
    #[arg(short, long, env = "TOASTY_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set TOASTY_DATA_DIR env var)
    #[arg(short, long, env = "TOASTY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: Arc<CoreEngine>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let policy = match load_config(&args.config) {
            Ok(policy) => policy,
            Err(ConfigError::ReadError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    config_path = %args.config.display(),
                    "No configuration file, using defaults"
                );
                Policy::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to load config from {:?}", args.config));
            }
        };

        info!(
            config_path = %args.config.display(),
            bed_count = policy.beds.len(),
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| policy.service.socket_path.clone());

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join("toastyd.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let actuator: Arc<dyn BedActuator> = match &policy.actuation.driver {
            DriverConfig::Command(driver) => {
                info!(program = ?driver.argv.first(), timeout = ?driver.timeout, "Using command bed driver");
                Arc::new(CommandActuator::new(driver.clone()))
            }
            DriverConfig::Mock => {
                warn!("Using mock bed driver; no hardware will be actuated");
                Arc::new(MockActuator::new())
            }
        };

        if is_mock_time_active() {
            warn!("Mock time is active; admission windows use the shifted clock");
        }

        let engine = CoreEngine::new(
            &policy,
            store.clone(),
            actuator,
            Arc::new(TokioExecutor::current()),
        );
        engine
            .sync_beds(&policy.beds)
            .context("Failed to register configured beds")?;

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        Ok(Self {
            engine: Arc::new(engine),
            ipc: Arc::new(ipc),
            store,
        })
    }

    async fn run(self) -> Result<()> {
        let ipc_ref = self.ipc.clone();
        let mut ipc_messages = ipc_ref
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let engine = self.engine.clone();
        let store = self.store.clone();

        let ipc_accept = ipc_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&engine, &ipc_ref, &store, msg);
                }
            }
        }

        // In-flight bed sequences are detached and are not awaited
        info!("Shutting down toastyd");

        if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Route one server message. Each request runs in its own task so a
    /// slow bed query never delays another kiosk.
    fn handle_ipc_message(
        engine: &Arc<CoreEngine>,
        ipc: &Arc<IpcServer>,
        store: &Arc<dyn Store>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                debug!(
                    client_id = %client_id,
                    request_id = request.request_id,
                    command = request.command.name(),
                    "Request received"
                );

                let engine = engine.clone();
                let ipc = ipc.clone();
                tokio::spawn(async move {
                    let response =
                        Self::handle_command(&engine, request.request_id, request.command).await;

                    if let Err(e) = ipc.send_response(&client_id, response).await {
                        debug!(client_id = %client_id, error = %e, "Client gone before response");
                    }
                });
            }

            ServerMessage::ClientConnected { client_id, info } => {
                info!(
                    client_id = %client_id,
                    uid = ?info.uid,
                    pid = ?info.pid,
                    "Client connected"
                );

                if let Err(e) = store.append_audit(AuditEvent::new(AuditEventType::ClientConnected {
                    client_id: client_id.to_string(),
                    uid: info.uid,
                })) {
                    warn!(error = %e, "Failed to log client connection");
                }
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                if let Err(e) =
                    store.append_audit(AuditEvent::new(AuditEventType::ClientDisconnected {
                        client_id: client_id.to_string(),
                    }))
                {
                    warn!(error = %e, "Failed to log client disconnection");
                }
            }
        }
    }

    async fn handle_command(engine: &Arc<CoreEngine>, request_id: u64, command: Command) -> Response {
        let now = toasty_util::now();

        match command {
            Command::CustomerLogin { fob_num } => {
                respond::admission(request_id, engine.admit(fob_num, &now))
            }

            Command::CancelSession { customer_id } => {
                respond::cancellation(request_id, engine.cancel(customer_id, &now))
            }

            Command::StartBed {
                bed_num,
                minutes,
                customer_id,
            } => respond::start_bed(request_id, engine.start_bed(bed_num, minutes, customer_id)),

            Command::BedStatus { customer_id } => {
                respond::bed_status(request_id, engine.bed_status(customer_id).await)
            }

            Command::RecentSessions { limit } => {
                let limit = limit.unwrap_or(DEFAULT_RECENT_SESSIONS_LIMIT);
                respond::recent_sessions(request_id, engine.recent_sessions(limit))
            }

            Command::GetHealth => {
                Response::success(request_id, ResponsePayload::Health(engine.health()))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "toastyd starting"
    );

    let service = Service::new(&args).await?;
    service.run().await
}
