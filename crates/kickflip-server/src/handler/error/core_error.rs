//! Comment service error to HTTP error conversion.

use kickflip_core::ErrorKind as CoreErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for comment service error conversions.
const TRACING_TARGET: &str = "kickflip_server::handler::core";

impl From<kickflip_core::Error> for HttpError<'static> {
    fn from(error: kickflip_core::Error) -> Self {
        match error.kind() {
            CoreErrorKind::StoreUnavailable => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Comment store unavailable"
                );
            }
            CoreErrorKind::CounterUpdateFailed | CoreErrorKind::Internal => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = error.kind_str(),
                    "Comment operation failed"
                );
            }
            CoreErrorKind::NotFound
            | CoreErrorKind::InvalidInput
            | CoreErrorKind::InvalidCursor => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = error.kind_str(),
                    "Comment request rejected"
                );
            }
        }

        let detail = error.message.clone();

        match error.kind() {
            CoreErrorKind::NotFound => {
                let http = ErrorKind::NotFound.into_error();
                match detail {
                    Some(detail) => http.with_resource(detail),
                    None => http,
                }
            }
            CoreErrorKind::InvalidInput => {
                let http = ErrorKind::BadRequest.into_error();
                match detail {
                    Some(detail) => http.with_message(detail),
                    None => http,
                }
            }
            CoreErrorKind::InvalidCursor => ErrorKind::BadRequest
                .with_message("Invalid pagination cursor")
                .with_suggestion("Request the first page without a cursor"),
            CoreErrorKind::StoreUnavailable => ErrorKind::ServiceUnavailable.into_error()
                .with_suggestion("Retry the request later")
                .with_context(error.to_string()),
            CoreErrorKind::CounterUpdateFailed | CoreErrorKind::Internal => {
                ErrorKind::InternalServerError.with_context(error.to_string())
            }
        }
    }
}
