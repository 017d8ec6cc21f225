pub mod auth;
pub mod cache;
pub mod clock;
pub mod consoles;
pub mod controller;
pub mod deletion;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod identity;
pub mod models;
pub mod notification;
pub mod openapi;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use handlers::{
    cancel_delete, confirm_delete, dismiss_notification, get_console, get_ical, healthz_live,
    healthz_ready, mount_console, reload_console, request_delete, root, set_filters,
    teardown_console,
};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::clock::SystemClock;
use crate::consoles::ConsoleRegistry;
use crate::ical::ICalExporter;
use crate::identity::{IdentityResolver, TokenIdentityResolver};
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::{HttpEventStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub consoles: Arc<ConsoleRegistry<HttpEventStore>>,
    pub identity: Arc<dyn IdentityResolver>,
    pub exporter: Arc<ICalExporter>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Result<Self, StoreError> {
        let store = HttpEventStore::new(settings.event_store_url.clone(), settings.request_timeout())?;
        let consoles = ConsoleRegistry::new(
            Arc::new(store),
            Arc::new(SystemClock),
            settings.console_options(),
        );
        Ok(Self {
            identity: Arc::new(TokenIdentityResolver::from_settings(&settings)),
            consoles: Arc::new(consoles),
            exporter: Arc::new(ICalExporter::new()),
            settings,
        })
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::from_settings(settings)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!(
        event_store = %state.settings.event_store_url,
        timezone = %state.settings.reference_timezone,
        "Starting Club Events Console API on {addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route(
            "/clubs/{club_id}/console",
            post(mount_console).get(get_console).delete(teardown_console),
        )
        .route("/clubs/{club_id}/console.ical", get(get_ical))
        .route("/clubs/{club_id}/console/reload", post(reload_console))
        .route("/clubs/{club_id}/console/filters", put(set_filters))
        .route(
            "/clubs/{club_id}/console/deletion",
            post(request_delete).delete(cancel_delete),
        )
        .route("/clubs/{club_id}/console/deletion/confirm", post(confirm_delete))
        .route("/clubs/{club_id}/console/notification", delete(dismiss_notification))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
