//! Координатор занятия мест.
//!
//! Каждый запрос проходит `Validating -> Deciding -> Committing`. Решение
//! принимается по снимку из хранилища, а запись делается только условно
//! (`available -> purchased`). Если между решением и записью место занял
//! кто-то другой, снимок перечитывается и попытка повторяется, не более
//! `max_retries` раз; дальше наружу уходит `Conflict`.
//!
//! Внутрипроцессных блокировок нет: взаимное исключение целиком держится
//! на условной записи в хранилище, поэтому несколько инстансов сервиса могут
//! работать с одной базой.

use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::allocation::{self, PairDecision, SeatDecision};
use crate::error::BookingError;
use crate::models::{Cinema, ClaimPair, ClaimSeat, NewCinema, Seat, SeatMap, SeatStatus};
use crate::store::SeatStore;

pub const DEFAULT_MAX_RETRIES: u32 = 1;

#[derive(Clone)]
pub struct ClaimCoordinator {
    store: Arc<dyn SeatStore>,
    max_retries: u32,
}

impl ClaimCoordinator {
    pub fn new(store: Arc<dyn SeatStore>) -> Self {
        Self::with_retries(store, DEFAULT_MAX_RETRIES)
    }

    pub fn with_retries(store: Arc<dyn SeatStore>, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    pub fn store(&self) -> &Arc<dyn SeatStore> {
        &self.store
    }

    /// Создает зал с местами `1..=seat_count`, все свободны.
    pub async fn create_cinema(&self, cmd: NewCinema) -> Result<Cinema, BookingError> {
        cmd.validate()?;

        let name = cmd.name.trim();
        // диапазон уже проверен валидатором
        let seat_count = cmd.seat_count as i32;

        let cinema = self.store.create_cinema(name, seat_count).await?;
        info!("Cinema {} '{}' created with {} seats", cinema.id, cinema.name, cinema.seat_count);
        Ok(cinema)
    }

    pub async fn get_cinema(&self, cinema_id: &str) -> Result<Cinema, BookingError> {
        let cinema_id = cinema_id.trim();
        self.store
            .get_cinema(cinema_id)
            .await?
            .ok_or_else(|| BookingError::CinemaNotFound { cinema_id: cinema_id.to_string() })
    }

    /// Текущая карта мест зала. Только для чтения, решения по ней не принимаются.
    pub async fn seat_map(&self, cinema_id: &str) -> Result<SeatMap, BookingError> {
        let cinema_id = cinema_id.trim();
        self.load_snapshot(cinema_id)
            .await?
            .ok_or_else(|| BookingError::CinemaNotFound { cinema_id: cinema_id.to_string() })
    }

    /// Покупка конкретного места.
    pub async fn claim_seat(&self, cmd: ClaimSeat) -> Result<Seat, BookingError> {
        cmd.validate()?;

        let cinema_id = cmd.cinema_id.trim();
        let seat_number = cmd.seat_number as i32;

        for attempt in 0..=self.max_retries {
            let snapshot = self.load_snapshot(cinema_id).await?;

            let seat = match allocation::select_seat(snapshot.as_ref(), seat_number) {
                SeatDecision::Eligible(seat) => seat,
                SeatDecision::CinemaNotFound => {
                    return Err(BookingError::CinemaNotFound { cinema_id: cinema_id.to_string() });
                }
                SeatDecision::SeatNotFound => {
                    return Err(BookingError::SeatNotFound {
                        cinema_id: cinema_id.to_string(),
                        seat_number,
                    });
                }
                SeatDecision::AlreadyTaken => {
                    debug!("seat {} in cinema {} is already purchased", seat_number, cinema_id);
                    return Err(BookingError::AlreadyPurchased {
                        cinema_id: cinema_id.to_string(),
                        seat_number,
                    });
                }
            };

            let claimed = self
                .store
                .conditional_claim(seat.id, SeatStatus::Available, SeatStatus::Purchased)
                .await?;

            if claimed {
                info!("Seat {} purchased in cinema {}", seat_number, cinema_id);
                return Ok(seat.purchased());
            }

            warn!(
                "Lost race for seat {} in cinema {} (attempt {}/{})",
                seat_number,
                cinema_id,
                attempt + 1,
                self.max_retries + 1
            );
        }

        Err(BookingError::Conflict { cinema_id: cinema_id.to_string() })
    }

    /// Покупка первой свободной пары соседних мест.
    ///
    /// Оба места занимаются одной групповой условной записью: либо оба,
    /// либо ни одного. Половина пары никогда не остается купленной.
    pub async fn claim_consecutive_pair(&self, cmd: ClaimPair) -> Result<[Seat; 2], BookingError> {
        cmd.validate()?;

        let cinema_id = cmd.cinema_id.trim();

        for attempt in 0..=self.max_retries {
            let snapshot = self.load_snapshot(cinema_id).await?;

            let (first, second) = match allocation::select_first_pair(snapshot.as_ref()) {
                PairDecision::Eligible(first, second) => (first, second),
                PairDecision::CinemaNotFound => {
                    return Err(BookingError::CinemaNotFound { cinema_id: cinema_id.to_string() });
                }
                PairDecision::NoPairAvailable => {
                    debug!("no consecutive pair left in cinema {}", cinema_id);
                    return Err(BookingError::NoPairAvailable { cinema_id: cinema_id.to_string() });
                }
            };

            let claimed = self
                .store
                .conditional_claim_all(&[first.id, second.id], SeatStatus::Available, SeatStatus::Purchased)
                .await?;

            if claimed {
                info!(
                    "Seats {} and {} purchased in cinema {}",
                    first.seat_number, second.seat_number, cinema_id
                );
                return Ok([first.purchased(), second.purchased()]);
            }

            warn!(
                "Lost race for seats {}-{} in cinema {} (attempt {}/{})",
                first.seat_number,
                second.seat_number,
                cinema_id,
                attempt + 1,
                self.max_retries + 1
            );
        }

        Err(BookingError::Conflict { cinema_id: cinema_id.to_string() })
    }

    async fn load_snapshot(&self, cinema_id: &str) -> Result<Option<SeatMap>, BookingError> {
        let Some(cinema) = self.store.get_cinema(cinema_id).await? else {
            return Ok(None);
        };
        let seats = self.store.list_seats(&cinema.id).await?;
        Ok(Some(SeatMap { cinema, seats }))
    }
}
