use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::handler::TRACING_TARGET_ERROR;

/// Serialized body of every error answer.
///
/// `context` and `status` stay on the server: the first is logged, the
/// second becomes the response status line.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier
    pub name: Cow<'a, str>,
    /// User-friendly error message safe for client display
    pub message: Cow<'a, str>,
    /// The resource that the error relates to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    /// Helpful suggestion for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Cow<'a, str>>,

    /// Internal context for debugging, not exposed to the client
    #[serde(skip)]
    pub context: Option<Cow<'a, str>>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be understood.",
        StatusCode::BAD_REQUEST,
    );
    pub const FORBIDDEN: Self = Self::new(
        "forbidden",
        "Only the author may do this.",
        StatusCode::FORBIDDEN,
    );
    pub const MALFORMED_ACTOR: Self = Self::new(
        "malformed_user_id",
        "The X-User-Id header is not a valid user id.",
        StatusCode::UNAUTHORIZED,
    );
    pub const MISSING_ACTOR: Self = Self::new(
        "missing_user_id",
        "This operation needs an X-User-Id header.",
        StatusCode::UNAUTHORIZED,
    );
    pub const MISSING_PATH_PARAM: Self = Self::new(
        "missing_path_param",
        "A path segment is missing or malformed.",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "No such post, comment or route.",
        StatusCode::NOT_FOUND,
    );
    pub const VALIDATION_ERROR: Self = Self::new(
        "validation_error",
        "The request body is invalid.",
        StatusCode::BAD_REQUEST,
    );

    // 5xx Server Errors
    pub const GATEWAY_TIMEOUT: Self = Self::new(
        "gateway_timeout",
        "The request timed out.",
        StatusCode::GATEWAY_TIMEOUT,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "Something went wrong on our side.",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "Comments are temporarily unavailable.",
        StatusCode::SERVICE_UNAVAILABLE,
    );

    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            suggestion: None,
            context: None,
            status,
        }
    }

    /// Replaces the default message of the template.
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    /// Names the resource the error is about, replacing any previous one.
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Adds a hint for the client. Hints accumulate.
    pub fn with_suggestion(mut self, suggestion: impl Into<Cow<'a, str>>) -> Self {
        self.suggestion = Some(append(self.suggestion.take(), suggestion.into()));
        self
    }

    /// Adds server-side context for the log line. Context accumulates.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        self.context = Some(append(self.context.take(), context.into()));
        self
    }
}

fn append<'a>(existing: Option<Cow<'a, str>>, next: Cow<'a, str>) -> Cow<'a, str> {
    match existing {
        Some(existing) => Cow::Owned(format!("{existing}; {next}")),
        None => next,
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    fn into_response(self) -> Response {
        let context = self.context.as_deref().unwrap_or_default();
        let resource = self.resource.as_deref().unwrap_or_default();

        if self.status.is_server_error() {
            tracing::error!(
                target: TRACING_TARGET_ERROR,
                status = self.status.as_u16(),
                name = %self.name,
                resource,
                context,
                "Request failed"
            );
        } else {
            tracing::warn!(
                target: TRACING_TARGET_ERROR,
                status = self.status.as_u16(),
                name = %self.name,
                message = %self.message,
                resource,
                "Request rejected"
            );
        }

        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_message_replaces_the_template() {
        let response = ErrorResponse::NOT_FOUND
            .with_message("Comment not found")
            .with_resource("post")
            .with_resource("comment");

        assert_eq!(response.message, "Comment not found");
        assert_eq!(response.resource.as_deref(), Some("comment"));
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn context_and_suggestions_accumulate() {
        let response = ErrorResponse::SERVICE_UNAVAILABLE
            .with_context("pool timed out")
            .with_context("comments.insert")
            .with_suggestion("Retry later");

        assert_eq!(
            response.context.as_deref(),
            Some("pool timed out; comments.insert")
        );
        assert_eq!(response.suggestion.as_deref(), Some("Retry later"));
    }

    #[test]
    fn context_is_not_serialized() -> anyhow::Result<()> {
        let response = ErrorResponse::SERVICE_UNAVAILABLE
            .with_context("pool timed out")
            .with_suggestion("Retry the request later");

        let value = serde_json::to_value(&response)?;
        assert_eq!(value["name"], "service_unavailable");
        assert_eq!(value["suggestion"], "Retry the request later");
        assert!(value.get("context").is_none());
        assert!(value.get("status").is_none());
        assert!(value.get("resource").is_none());
        Ok(())
    }
}
