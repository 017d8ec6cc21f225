use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::authorize,
    cache::LoadStatus,
    controller::{ConsoleView, EventConsole},
    deletion::DeleteOutcome,
    error::ApiError,
    models::{ClubId, EventId},
    pipeline::FilterState,
    store::HttpEventStore,
    validation::{validate_club_id, validate_search_term},
};

type Console = Arc<EventConsole<HttpEventStore>>;
type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteRequest {
    #[schema(value_type = String)]
    pub event_id: EventId,
}

fn authorized_club(
    state: &AppState,
    auth: BearerHeader,
    query: &TokenQuery,
    club_id: &str,
) -> Result<ClubId, ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    let actor = authorize(state.identity.as_ref(), auth_header, query.token.as_deref())?;
    let club_id = validate_club_id(club_id)?;
    debug!(subject = %actor.subject, %club_id, "authorized console request");
    Ok(club_id)
}

fn mounted_console(state: &AppState, club_id: &ClubId) -> Result<Console, ApiError> {
    state
        .consoles
        .get(club_id)
        .ok_or_else(|| ApiError::NotFound(format!("No console mounted for club {club_id}")))
}

#[utoipa::path(get, path = "/", tag = "console")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Club Events Console API",
        "endpoints": {
            "/clubs/{club_id}/console": "Mount, view or tear down a club's event console",
            "/clubs/{club_id}/console.ical": "Download upcoming events as iCal file"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "console")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "console")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    post,
    path = "/clubs/{club_id}/console",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Console mounted; loads the snapshot unless one is already held", body = ConsoleView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn mount_console(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = state.consoles.mount(&club_id);
    if console.status() != LoadStatus::Ready {
        console.load().await;
    }
    Ok(Json(console.view()))
}

#[utoipa::path(
    get,
    path = "/clubs/{club_id}/console",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Current console view", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn get_console(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    Ok(Json(console.view()))
}

#[utoipa::path(
    delete,
    path = "/clubs/{club_id}/console",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 204, description = "Console torn down"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn teardown_console(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    if state.consoles.teardown(&club_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No console mounted for club {club_id}")))
    }
}

#[utoipa::path(
    post,
    path = "/clubs/{club_id}/console/reload",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Console view after reload", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn reload_console(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    console.load().await;
    Ok(Json(console.view()))
}

#[utoipa::path(
    put,
    path = "/clubs/{club_id}/console/filters",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = FilterState,
    responses(
        (status = 200, description = "Console view with the new filters", body = ConsoleView),
        (status = 400, description = "Search term too long"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn set_filters(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(filters): Json<FilterState>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    validate_search_term(&filters.search_term)?;
    console.set_search_term(filters.search_term);
    console.set_date_filter(filters.date_filter);
    Ok(Json(console.view()))
}

#[utoipa::path(
    post,
    path = "/clubs/{club_id}/console/deletion",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Deletion awaits confirmation", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted or event unknown"),
        (status = 409, description = "Another deletion is being committed")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn request_delete(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    if !console.contains(&request.event_id) {
        return Err(ApiError::NotFound(format!(
            "Event {} not found",
            request.event_id
        )));
    }
    if !console.request_delete(request.event_id) {
        return Err(ApiError::Conflict("A deletion is already in progress".into()));
    }
    Ok(Json(console.view()))
}

#[utoipa::path(
    delete,
    path = "/clubs/{club_id}/console/deletion",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Pending deletion cancelled", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn cancel_delete(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    console.cancel_delete();
    Ok(Json(console.view()))
}

#[utoipa::path(
    post,
    path = "/clubs/{club_id}/console/deletion/confirm",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Deletion committed or failed; see notification", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted, or torn down before the delete finished"),
        (status = 409, description = "Nothing awaits confirmation, or events are reloading")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn confirm_delete(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    match console.confirm_delete().await {
        DeleteOutcome::Deleted(_) | DeleteOutcome::Failed(_) => Ok(Json(console.view())),
        DeleteOutcome::Ignored => Err(ApiError::Conflict("No deletion awaits confirmation".into())),
        DeleteOutcome::Deferred(id) => Err(ApiError::Conflict(format!(
            "Events are reloading; confirm the deletion of event {id} again once loaded"
        ))),
        DeleteOutcome::Discarded(id) => Err(ApiError::NotFound(format!(
            "Console for club {club_id} was torn down before event {id} was deleted"
        ))),
    }
}

#[utoipa::path(
    delete,
    path = "/clubs/{club_id}/console/notification",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Notification dismissed", body = ConsoleView),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn dismiss_notification(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<ConsoleView>, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    console.dismiss_notification();
    Ok(Json(console.view()))
}

#[utoipa::path(
    get,
    path = "/clubs/{club_id}/console.ical",
    params(
        ("club_id" = String, Path, description = "Club identifier"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file of the filtered upcoming events", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Console not mounted")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "console"
)]
pub async fn get_ical(
    State(state): State<AppState>,
    auth: BearerHeader,
    Path(club_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let club_id = authorized_club(&state, auth, &query, &club_id)?;
    let console = mounted_console(&state, &club_id)?;
    let view = console.view();
    let body = state.exporter.generate(&club_id, &view.upcoming);
    let disposition = format!("attachment; filename={club_id}_events.ics");
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar".to_string()),
            ("content-disposition", disposition),
        ],
        body,
    ))
}
