//! Acting user extraction.
//!
//! Authentication happens in front of this service, which forwards the
//! verified user id in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::handler::{Error, ErrorKind, TRACING_TARGET_ACTOR};

/// Header carrying the id of the acting user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf a request is made.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
}

impl Actor {
    #[inline]
    pub const fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    fn from_parts(parts: &Parts) -> Result<Self, Error<'static>> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Err(ErrorKind::MissingActor
                .with_resource("user")
                .with_suggestion("Send the acting user id in the X-User-Id header"));
        };

        let user_id = value
            .to_str()
            .ok()
            .and_then(|value| Uuid::try_parse(value.trim()).ok())
            .ok_or_else(|| {
                ErrorKind::MalformedActor
                    .with_resource("user")
                    .with_context("X-User-Id is not a valid UUID")
            })?;

        Ok(Self::new(user_id))
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Reuse an actor already extracted for this request.
        if let Some(actor) = parts.extensions.get::<Self>() {
            return Ok(*actor);
        }

        let actor = Self::from_parts(parts).inspect_err(|error| {
            tracing::debug!(
                target: TRACING_TARGET_ACTOR,
                error = %error,
                "Rejected request without a usable acting user"
            );
        })?;

        parts.extensions.insert(actor);
        Ok(actor)
    }
}
