//! Success envelope for API handlers: every 2xx body is `{ "data": ... }`.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{ "data": T }`. Handlers return it directly:
///
/// ```ignore
/// Ok(DataResponse::new(product))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
