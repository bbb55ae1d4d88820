//! Caller identity as handed over by the external identity provider.
//! Authentication happens elsewhere; this service only asks whether the caller is the
//! configured administrator.
// region:    --- Imports
use crate::error::AuctionError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

// endregion: --- Imports

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentIdentity {
    uid: Option<String>,
}

impl CurrentIdentity {
    pub fn anonymous() -> Self {
        Self { uid: None }
    }

    pub fn user(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|uid| !uid.is_empty());
        Ok(match uid {
            Some(uid) => CurrentIdentity::user(uid),
            None => CurrentIdentity::anonymous(),
        })
    }
}

/// Knows which identity is the administrator. With no administrator configured nobody
/// is one.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    admin_uid: Option<String>,
}

impl AdminPolicy {
    pub fn new(admin_uid: Option<String>) -> Self {
        Self { admin_uid }
    }

    pub fn is_admin(&self, identity: &CurrentIdentity) -> bool {
        matches!(
            (self.admin_uid.as_deref(), identity.uid()),
            (Some(admin), Some(uid)) if admin == uid
        )
    }

    pub fn authorize(&self, identity: &CurrentIdentity) -> Result<(), AuctionError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(AuctionError::Unauthorized)
        }
    }
}
