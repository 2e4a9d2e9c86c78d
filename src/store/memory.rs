use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Cinema, Seat, SeatStatus};
use crate::store::{SeatStore, StoreResult};

#[derive(Default)]
struct Inner {
    cinemas: HashMap<String, Cinema>,
    // места зала лежат по порядку номеров: seats[cinema][n - 1]
    seats: HashMap<String, Vec<Seat>>,
    seat_index: HashMap<i64, (String, usize)>,
    next_seat_id: i64,
}

impl Inner {
    fn seat(&self, seat_id: i64) -> Option<&Seat> {
        let (cinema_id, pos) = self.seat_index.get(&seat_id)?;
        self.seats.get(cinema_id)?.get(*pos)
    }

    fn seat_mut(&mut self, seat_id: i64) -> Option<&mut Seat> {
        let (cinema_id, pos) = self.seat_index.get(&seat_id)?;
        self.seats.get_mut(cinema_id)?.get_mut(*pos)
    }
}

/// In-process хранилище. Все операции выполняются под одним мьютексом,
/// поэтому каждая из них неделима, включая групповой claim.
#[derive(Default)]
pub struct MemorySeatStore {
    inner: Mutex<Inner>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeatStore for MemorySeatStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        async move {
            let mut inner = self.inner.lock().await;
            let cinema = Cinema {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                seat_count,
                created_at: Utc::now(),
            };

            let mut seats = Vec::with_capacity(seat_count.max(0) as usize);
            for number in 1..=seat_count {
                inner.next_seat_id += 1;
                let id = inner.next_seat_id;
                inner.seat_index.insert(id, (cinema.id.clone(), seats.len()));
                seats.push(Seat {
                    id,
                    cinema_id: cinema.id.clone(),
                    seat_number: number,
                    status: SeatStatus::Available,
                });
            }

            inner.seats.insert(cinema.id.clone(), seats);
            inner.cinemas.insert(cinema.id.clone(), cinema.clone());
            Ok(cinema)
        }
        .boxed()
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        async move { Ok(self.inner.lock().await.cinemas.get(cinema_id).cloned()) }.boxed()
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        async move {
            Ok(self
                .inner
                .lock()
                .await
                .seats
                .get(cinema_id)
                .cloned()
                .unwrap_or_default())
        }
        .boxed()
    }

    fn conditional_claim(
        &self,
        seat_id: i64,
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'_, StoreResult<bool>> {
        async move {
            let mut inner = self.inner.lock().await;
            match inner.seat_mut(seat_id) {
                Some(seat) if seat.status == expected => {
                    seat.status = new;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
        .boxed()
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        async move {
            let ids: BTreeSet<i64> = seat_ids.iter().copied().collect();
            let mut inner = self.inner.lock().await;

            // сначала проверяем все, потом меняем: либо все, либо ничего
            let all_match = ids
                .iter()
                .all(|id| inner.seat(*id).is_some_and(|seat| seat.status == expected));
            if ids.is_empty() || !all_match {
                return Ok(false);
            }

            for id in &ids {
                if let Some(seat) = inner.seat_mut(*id) {
                    seat.status = new;
                }
            }
            Ok(true)
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        async { Ok(()) }.boxed()
    }
}
