//! HTTP request extractors with JSON error responses.
//!
//! Drop-in replacements for the axum extractors of the same name whose
//! rejections render as [`handler::Error`], plus [`Actor`] for the acting
//! user.
//!
//! [`handler::Error`]: crate::handler::Error

mod actor;
pub mod reject;

pub use crate::extract::actor::{Actor, USER_ID_HEADER};
pub use crate::extract::reject::{Json, Path, Query, ValidateJson};
