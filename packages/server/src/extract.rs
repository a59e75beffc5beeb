//! Request extractors that answer with [`HttpError`]
//!
//! axum's own `Json`, `Query` and `Path` reject malformed input with a
//! plain-text body. These wrappers run the same extraction and turn the
//! rejection into a `VALIDATION_ERROR` JSON body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::HttpError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(HttpError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(HttpError))]
pub struct ApiQuery<T>(pub T);

/// Path segments
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(HttpError))]
pub struct ApiPath<T>(pub T);
