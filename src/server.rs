use crate::cli::ServeArgs;
use crate::routes::{with_filing_routes, AppState};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tax_filing::config::AppConfig;
use tax_filing::error::AppError;
use tax_filing::filing::{FilingEngine, FilingService};
use tracing::info;

pub(crate) async fn run(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = FilingEngine::with_thresholds(&config.filing.thresholds);
    let rule_count = engine.rules().len();
    let service = Arc::new(FilingService::new(engine));

    let app = with_filing_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, rule_count, "filing obligation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
