use crate::cli::ServeArgs;
use crate::infra::{seed_demo, AppState, InMemoryPracticumStore, LoggingNotifier};
use crate::routes::with_practicum_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pps_engine::config::{AppConfig, StaticThresholds};
use pps_engine::error::AppError;
use pps_engine::telemetry;
use pps_engine::workflows::practicum::SelectionService;
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

    let store = InMemoryPracticumStore::default();
    if args.seed_demo {
        seed_demo(&store);
    }
    let thresholds = StaticThresholds(config.academic.clone());
    let selection_service = Arc::new(SelectionService::from_provider(
        Arc::new(store),
        Arc::new(LoggingNotifier::default()),
        &thresholds,
    ));

    let app = with_practicum_routes(selection_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        hours_total_required = config.academic.eligibility.hours_total_required,
        seeded = args.seed_demo,
        "practicum selection service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
