use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::controllers::parse_body;
use crate::error::BookingError;
use crate::models::{ClaimPair, ClaimSeat, Seat, SeatStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/book-ticket", post(book_ticket))
        .route("/book-consecutive", post(book_consecutive))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchasedSeat {
    seat_number: i32,
    status: SeatStatus,
    cinema_id: String,
}

impl From<Seat> for PurchasedSeat {
    fn from(seat: Seat) -> Self {
        Self {
            seat_number: seat.seat_number,
            status: seat.status,
            cinema_id: seat.cinema_id,
        }
    }
}

async fn invalidate_seat_map(state: &AppState, cinema_id: &str) {
    if let Some(cache) = &state.cache {
        cache.invalidate_seats(cinema_id).await;
    }
}

// POST /api/book-ticket
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicketRequest {
    cinema_id: Option<String>,
    seat_number: Option<i64>,
}

#[derive(Debug, Serialize)]
struct BookTicketResponse {
    message: &'static str,
    seat: PurchasedSeat,
}

async fn book_ticket(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookTicketRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let req = parse_body(body)?;

    let seat = state
        .coordinator
        .claim_seat(ClaimSeat {
            cinema_id: req.cinema_id.unwrap_or_default(),
            seat_number: req.seat_number.unwrap_or(0),
        })
        .await?;

    invalidate_seat_map(&state, &seat.cinema_id).await;

    Ok(Json(BookTicketResponse {
        message: "Seat purchased successfully",
        seat: seat.into(),
    }))
}

// POST /api/book-consecutive
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookConsecutiveRequest {
    cinema_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookConsecutiveResponse {
    message: &'static str,
    seats: Vec<PurchasedSeat>,
}

async fn book_consecutive(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookConsecutiveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let req = parse_body(body)?;

    let seats = state
        .coordinator
        .claim_consecutive_pair(ClaimPair {
            cinema_id: req.cinema_id.unwrap_or_default(),
        })
        .await?;

    invalidate_seat_map(&state, &seats[0].cinema_id).await;

    Ok(Json(BookConsecutiveResponse {
        message: "Two consecutive seats purchased successfully",
        seats: seats.into_iter().map(PurchasedSeat::from).collect(),
    }))
}
