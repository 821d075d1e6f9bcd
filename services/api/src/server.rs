use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryBenchmarkCatalog, InMemoryProviderLedger};
use crate::routes::with_metrics_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use provider_comp::compensation::metrics::CompensationMetricsService;
use provider_comp::config::AppConfig;
use provider_comp::error::AppError;
use provider_comp::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(InMemoryProviderLedger::default());
    let catalog = Arc::new(InMemoryBenchmarkCatalog::default());
    let metrics_service = Arc::new(CompensationMetricsService::new(
        ledger,
        catalog,
        config.engine,
    ));

    let app = with_metrics_routes(metrics_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        fte_basis = ?config.engine.fte_basis,
        tier_boundary = ?config.engine.tier_boundary,
        %addr,
        "provider compensation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
