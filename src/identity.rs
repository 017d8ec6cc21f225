use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Club(Actor),
    Unauthenticated,
}

/// Maps a presented credential to the acting club, if any.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: Option<&str>) -> Identity;
}

/// Accepts the single shared console token from configuration.
#[derive(Debug, Clone)]
pub struct TokenIdentityResolver {
    token: String,
}

impl TokenIdentityResolver {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.auth_token.clone())
    }
}

impl IdentityResolver for TokenIdentityResolver {
    fn resolve(&self, credential: Option<&str>) -> Identity {
        match credential {
            Some(token) if token == self.token => Identity::Club(Actor {
                subject: "club-console".to_string(),
            }),
            _ => Identity::Unauthenticated,
        }
    }
}
