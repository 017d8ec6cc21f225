use crate::error::ApiError;
use crate::models::ClubId;

const MAX_CLUB_ID_LEN: usize = 64;
const MAX_SEARCH_TERM_LEN: usize = 200;

pub fn validate_club_id(value: &str) -> Result<ClubId, ApiError> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_CLUB_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(ClubId::new(value))
    } else {
        Err(ApiError::BadRequest(
            "club id must be 1-64 characters of letters, digits, '-' or '_'".into(),
        ))
    }
}

pub fn validate_search_term(value: &str) -> Result<&str, ApiError> {
    if value.chars().count() <= MAX_SEARCH_TERM_LEN {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(
            "search term must be at most 200 characters".into(),
        ))
    }
}
