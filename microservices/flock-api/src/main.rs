//! Flock API service binary

use flock_core::{
    DependencyStatus, FlockService, HealthStatus, ReadinessStatus, Result, ServiceRuntime,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use flock_api::auth::CredentialGate;
use flock_api::config::ApiConfig;
use flock_api::infrastructure::{MemoryEventStore, MemoryPrincipalStore, PrincipalStore};
use flock_api::notifications::{NotificationConfigStore, WebhookTransport};
use flock_api::pipeline::{NotificationDispatcher, PartitionedWriter, SubmissionPipeline};
use flock_api::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flock_api=debug".parse().expect("valid tracing directive")),
        )
        .json()
        .init();

    info!("Starting Flock API");

    let service = Arc::new(FlockApiService::new().await?);
    ServiceRuntime::run(service).await
}

pub struct FlockApiService {
    config: ApiConfig,
    state: AppState,
    start_time: std::time::Instant,
}

impl FlockApiService {
    pub async fn new() -> Result<Self> {
        let config = ApiConfig::from_env()?;

        let principals: Arc<dyn PrincipalStore> = Arc::new(MemoryPrincipalStore::new());
        let events = Arc::new(MemoryEventStore::new());
        let notification_config = Arc::new(NotificationConfigStore::default());

        let transport = Arc::new(WebhookTransport::new(
            &config.chat_webhook_url,
            &config.chat_channel,
        ));
        let dispatcher = NotificationDispatcher::new(
            transport,
            Duration::from_secs(config.send_timeout_secs),
        );
        let pipeline = Arc::new(SubmissionPipeline::new(
            PartitionedWriter::new(events),
            dispatcher,
            notification_config,
        ));

        let state = AppState {
            gate: Arc::new(CredentialGate::new(principals.clone())),
            principals,
            pipeline,
        };

        Ok(Self {
            config,
            state,
            start_time: std::time::Instant::now(),
        })
    }
}

#[async_trait::async_trait]
impl FlockService for FlockApiService {
    fn service_id(&self) -> &'static str {
        "flock-api"
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: self.service_id().to_string(),
            version: self.version().to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    async fn ready(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: true,
            dependencies: vec![DependencyStatus {
                name: "event_store".to_string(),
                available: true,
                latency_ms: Some(1),
            }],
        }
    }

    async fn shutdown(&self) -> Result<()> {
        let stats = self.state.pipeline.dispatch_stats();
        info!(
            sent = stats.sent,
            suppressed = stats.suppressed,
            failed = stats.failed,
            "Shutting down Flock API"
        );
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        info!(http = %self.config.http_bind, "Starting Flock API server");

        let router = create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(&self.config.http_bind).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
