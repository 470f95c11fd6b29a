use crate::cli::ServeArgs;
use crate::infra::{seed_store, AppState, LoggingNotificationQueue};
use crate::routes::with_desk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nomination_desk::config::AppConfig;
use nomination_desk::error::AppError;
use nomination_desk::telemetry;
use nomination_desk::workflows::moderation::ModerationService;
use nomination_desk::workflows::nomination::{NominationService, OrderEngine};
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
    if let Some(roster) = args.roster.take() {
        config.nomination.roster_path = Some(roster);
    }
    if let Some(pattern) = args.pattern.take() {
        config.nomination.pattern_path = Some(pattern);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pattern = config.nomination.reservation_pattern()?;
    let store = Arc::new(seed_store(&config.nomination)?);
    let nomination_service = Arc::new(NominationService::new(
        store.clone(),
        OrderEngine::new(pattern),
    ));
    let order = nomination_service.recompute()?;
    let moderation_service = Arc::new(ModerationService::new(
        store,
        Arc::new(LoggingNotificationQueue::default()),
    ));

    let app = with_desk_routes(nomination_service, moderation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, candidates = order.len(), "nomination desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}
