use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::cache::LoadStatus;
use crate::controller::ConsoleView;
use crate::handlers::DeleteRequest;
use crate::models::{EventId, EventRecord};
use crate::notification::{Notification, NotificationKind};
use crate::pipeline::{FilterState, ListedEvent};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::mount_console,
        crate::handlers::get_console,
        crate::handlers::teardown_console,
        crate::handlers::reload_console,
        crate::handlers::set_filters,
        crate::handlers::request_delete,
        crate::handlers::cancel_delete,
        crate::handlers::confirm_delete,
        crate::handlers::dismiss_notification,
        crate::handlers::get_ical
    ),
    components(schemas(
        ConsoleView,
        ListedEvent,
        EventRecord,
        EventId,
        FilterState,
        LoadStatus,
        Notification,
        NotificationKind,
        DeleteRequest
    )),
    tags(
        (name = "console", description = "Club event console operations")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
