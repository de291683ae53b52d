//! Query string extractor.

use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequestParts, Query as AxumQuery};
use axum::http::request::Parts;
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;

use super::sanitize_error_message;
use crate::handler::{Error, ErrorKind, TRACING_TARGET_EXTRACT};

/// Query parameter extractor with field-level rejection messages.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AxumQuery::<T>::from_request_parts(parts, state).await {
            Ok(AxumQuery(query)) => Ok(Self(query)),
            Err(rejection) => Err(enhance_query_error(rejection)),
        }
    }
}

fn enhance_query_error(rejection: QueryRejection) -> Error<'static> {
    tracing::debug!(
        target: TRACING_TARGET_EXTRACT,
        error = %rejection,
        "Query parameter parsing failed"
    );

    let QueryRejection::FailedToDeserializeQueryString(err) = rejection else {
        return ErrorKind::BadRequest
            .with_message("The query string could not be parsed")
            .with_resource("query");
    };

    let detail = err.body_text();
    let field = backticked_field(&detail).unwrap_or("query").to_owned();

    let error = if detail.contains("duplicate field") {
        ErrorKind::BadRequest.with_message(format!("Query parameter {field} is given more than once"))
    } else if detail.contains("invalid digit") || detail.contains("invalid type") {
        ErrorKind::BadRequest
            .with_message(format!("Query parameter {field} has the wrong type"))
            .with_suggestion("limit takes a positive integer, cursor the token of a previous page")
    } else {
        ErrorKind::BadRequest.with_message("Invalid query parameters")
    };

    error
        .with_resource(field)
        .with_context(sanitize_error_message(&detail))
}

/// Returns the first `` `quoted` `` identifier of a serde error message.
fn backticked_field(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once('`')?;
    let (field, _) = rest.split_once('`')?;
    Some(field).filter(|field| !field.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_quoted_field() {
        assert_eq!(backticked_field("duplicate field `limit`"), Some("limit"));
        assert_eq!(backticked_field("unknown variant ``"), None);
        assert_eq!(backticked_field("invalid digit found in string"), None);
    }
}
