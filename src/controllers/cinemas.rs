use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::controllers::parse_body;
use crate::error::BookingError;
use crate::models::{NewCinema, Seat, SeatStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cinemas", post(create_cinema))
        // старый путь создания зала
        .route("/cinema", post(create_cinema))
        .route("/cinemas/{cinema_id}", get(get_cinema))
        .route("/cinemas/{cinema_id}/seats", get(get_seats))
}

// POST /api/cinemas (и /api/cinema)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCinemaRequest {
    name: Option<String>,
    number_of_seats: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCinemaResponse {
    message: &'static str,
    cinema_id: String,
    name: String,
    number_of_seats: i32,
}

async fn create_cinema(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCinemaRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let req = parse_body(body)?;

    let cinema = state
        .coordinator
        .create_cinema(NewCinema {
            name: req.name.unwrap_or_default(),
            seat_count: req.number_of_seats.unwrap_or(0),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateCinemaResponse {
            message: "Cinema created successfully",
            cinema_id: cinema.id,
            name: cinema.name,
            number_of_seats: cinema.seat_count,
        }),
    ))
}

// GET /api/cinemas/{cinema_id}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CinemaResponse {
    cinema_id: String,
    name: String,
    number_of_seats: i32,
    created_at: DateTime<Utc>,
}

async fn get_cinema(
    State(state): State<Arc<AppState>>,
    Path(cinema_id): Path<String>,
) -> Result<impl IntoResponse, BookingError> {
    let cinema = state.coordinator.get_cinema(&cinema_id).await?;

    Ok(Json(CinemaResponse {
        cinema_id: cinema.id,
        name: cinema.name,
        number_of_seats: cinema.seat_count,
        created_at: cinema.created_at,
    }))
}

// GET /api/cinemas/{cinema_id}/seats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatView {
    seat_number: i32,
    status: SeatStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeatMapResponse {
    cinema_id: String,
    seats: Vec<SeatView>,
}

fn seat_map_response(cinema_id: &str, seats: &[Seat], cache_status: &'static str) -> Response {
    let body = SeatMapResponse {
        cinema_id: cinema_id.to_string(),
        seats: seats
            .iter()
            .map(|s| SeatView {
                seat_number: s.seat_number,
                status: s.status,
            })
            .collect(),
    };
    ([("X-Cache", cache_status)], Json(body)).into_response()
}

async fn get_seats(
    State(state): State<Arc<AppState>>,
    Path(cinema_id): Path<String>,
) -> Result<Response, BookingError> {
    let cinema_id = cinema_id.trim();

    // 1. Пробуем кеш; поколение берем до чтения хранилища
    let mut generation = None;
    if let Some(cache) = &state.cache {
        if let Some(seats) = cache.get_seats(cinema_id).await {
            return Ok(seat_map_response(cinema_id, &seats, "HIT"));
        }
        generation = cache.generation(cinema_id).await;
    }

    // 2. Промах: читаем из хранилища и кладем в кеш, если за это время
    // никто не инвалидировал карту
    let map = state.coordinator.seat_map(cinema_id).await?;
    if let (Some(cache), Some(generation)) = (&state.cache, generation) {
        cache.save_seats(&map.cinema.id, generation, &map.seats).await;
    }

    Ok(seat_map_response(&map.cinema.id, &map.seats, "MISS"))
}
