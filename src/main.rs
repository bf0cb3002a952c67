use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use trip_admin::config::AppConfig;
use trip_admin::error::AppError;
use trip_admin::routes::create_router;
use trip_admin::services::trip_api::TripApiClient;
use trip_admin::state::AppState;
use trip_admin::view::TripListView;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    info!(api = %config.api_base, "using trip api");

    let api = TripApiClient::new(config.api_base.clone());
    let trips = TripListView::new(Arc::new(api));
    trips.mount();

    let state = AppState::new(config.clone(), trips);
    let app = create_router(state.clone());

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.trips.unmount();
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trip_admin=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
