//! HTTP handlers. Successful responses share one envelope:
//! `{"status": <code>, "data": {...}}`.

pub mod devices;
pub mod health;
pub mod notifications;
pub mod subscriptions;
pub mod users;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Envelope<T> {
    status: u16,
    data: T,
}

#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Json(Envelope {
            status: self.status.as_u16(),
            data: self.data,
        });
        (self.status, body).into_response()
    }
}
