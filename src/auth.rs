use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::error::ApiError;
use crate::identity::{Actor, Identity, IdentityResolver};

/// Resolves the caller from a bearer header, falling back to a `token` query
/// parameter.
pub fn authorize(
    resolver: &dyn IdentityResolver,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<Actor, ApiError> {
    let provided_token = auth
        .map(|a| a.token().to_string())
        .or_else(|| query_token.map(|s| s.to_string()));
    match resolver.resolve(provided_token.as_deref()) {
        Identity::Club(actor) => Ok(actor),
        Identity::Unauthenticated => Err(ApiError::Unauthorized(
            "Invalid authentication token".into(),
        )),
    }
}
