use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use validator::ValidationErrors;

/// Сбой хранилища. Никогда не маскируется под доменную ошибку.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("Cinema not found.")]
    CinemaNotFound { cinema_id: String },

    #[error("Seat not found.")]
    SeatNotFound { cinema_id: String, seat_number: i32 },

    #[error("Seat is already purchased.")]
    AlreadyPurchased { cinema_id: String, seat_number: i32 },

    #[error("No two consecutive seats available in this cinema.")]
    NoPairAvailable { cinema_id: String },

    #[error("Seat was claimed by a concurrent request, please retry.")]
    Conflict { cinema_id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::CinemaNotFound { .. } | BookingError::SeatNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            BookingError::AlreadyPurchased { .. }
            | BookingError::NoPairAvailable { .. }
            | BookingError::Conflict { .. } => StatusCode::CONFLICT,
            BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for BookingError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect::<Vec<_>>()
            .join(" ");

        BookingError::Validation(message)
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BookingError::Store(e) => {
                tracing::error!("store failure: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
