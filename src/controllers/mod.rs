pub mod bookings;
pub mod cinemas;

use axum::{extract::rejection::JsonRejection, Json, Router};
use std::sync::Arc;

use crate::error::BookingError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(cinemas::routes())
        .merge(bookings::routes())
}

// Битый JSON, не то число или не тот тип поля — это ошибка валидации (400)
fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, BookingError> {
    body.map(|Json(req)| req)
        .map_err(|rejection| BookingError::Validation(rejection.body_text()))
}
