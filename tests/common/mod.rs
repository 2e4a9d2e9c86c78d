#![allow(dead_code)]

use cinema_booking::cache::SeatCache;
use cinema_booking::error::StoreError;
use cinema_booking::models::{Cinema, Seat, SeatStatus};
use cinema_booking::store::{MemorySeatStore, SeatStore, StoreResult};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub fn cinema_name() -> String {
    CompanyName().fake()
}

pub async fn statuses(store: &dyn SeatStore, cinema_id: &str) -> Vec<SeatStatus> {
    store
        .list_seats(cinema_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.status)
        .collect()
}

/// Another buyer who sneaks in between our decision and our write.
/// On each of the first `wins` claims it purchases the last requested seat
/// first, so our own conditional write loses the race.
pub struct RivalStore {
    pub inner: MemorySeatStore,
    wins: AtomicU32,
}

impl RivalStore {
    pub fn new(wins: u32) -> Self {
        Self {
            inner: MemorySeatStore::new(),
            wins: AtomicU32::new(wins),
        }
    }

    fn rival_moves(&self) -> bool {
        self.wins
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| w.checked_sub(1))
            .is_ok()
    }

    async fn steal_then_claim(&self, seat_ids: &[i64], expected: SeatStatus, new: SeatStatus) -> StoreResult<bool> {
        if self.rival_moves() {
            if let Some(last) = seat_ids.last() {
                let stolen = self.inner.conditional_claim(*last, expected, new).await?;
                assert!(stolen, "rival expected seat {} to be free", last);
            }
        }
        if seat_ids.len() == 1 {
            self.inner.conditional_claim(seat_ids[0], expected, new).await
        } else {
            self.inner.conditional_claim_all(seat_ids, expected, new).await
        }
    }
}

impl SeatStore for RivalStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.inner.create_cinema(name, seat_count)
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.inner.get_cinema(cinema_id)
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        self.inner.list_seats(cinema_id)
    }

    fn conditional_claim(&self, seat_id: i64, expected: SeatStatus, new: SeatStatus) -> BoxFuture<'_, StoreResult<bool>> {
        async move { self.steal_then_claim(&[seat_id], expected, new).await }.boxed()
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.steal_then_claim(seat_ids, expected, new).boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.inner.ping()
    }
}

/// Reads succeed, but every conditional write reports that nothing changed.
pub struct AlwaysLosesStore {
    pub inner: MemorySeatStore,
    pub claim_attempts: AtomicU32,
}

impl AlwaysLosesStore {
    pub fn new() -> Self {
        Self {
            inner: MemorySeatStore::new(),
            claim_attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.claim_attempts.load(Ordering::SeqCst)
    }
}

impl SeatStore for AlwaysLosesStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.inner.create_cinema(name, seat_count)
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.inner.get_cinema(cinema_id)
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        self.inner.list_seats(cinema_id)
    }

    fn conditional_claim(&self, _seat_id: i64, _expected: SeatStatus, _new: SeatStatus) -> BoxFuture<'_, StoreResult<bool>> {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(false)).boxed()
    }

    fn conditional_claim_all<'a>(
        &'a self,
        _seat_ids: &'a [i64],
        _expected: SeatStatus,
        _new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(Ok(false)).boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.inner.ping()
    }
}

/// Counts every call; used to prove that invalid input never reaches the store.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemorySeatStore,
    pub calls: AtomicU32,
}

impl CountingStore {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl SeatStore for CountingStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.hit();
        self.inner.create_cinema(name, seat_count)
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.hit();
        self.inner.get_cinema(cinema_id)
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        self.hit();
        self.inner.list_seats(cinema_id)
    }

    fn conditional_claim(&self, seat_id: i64, expected: SeatStatus, new: SeatStatus) -> BoxFuture<'_, StoreResult<bool>> {
        self.hit();
        self.inner.conditional_claim(seat_id, expected, new)
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.hit();
        self.inner.conditional_claim_all(seat_ids, expected, new)
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.inner.ping()
    }
}

/// Knows one cinema but cannot read its seats.
pub struct BrokenSeatsStore {
    pub inner: MemorySeatStore,
}

impl SeatStore for BrokenSeatsStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.inner.create_cinema(name, seat_count)
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.inner.get_cinema(cinema_id)
    }

    fn list_seats<'a>(&'a self, _cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        futures::future::ready(Err(StoreError::CorruptRow("status 'sold'".into()))).boxed()
    }

    fn conditional_claim(&self, seat_id: i64, expected: SeatStatus, new: SeatStatus) -> BoxFuture<'_, StoreResult<bool>> {
        self.inner.conditional_claim(seat_id, expected, new)
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.inner.conditional_claim_all(seat_ids, expected, new)
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        futures::future::ready(Err(StoreError::CorruptRow("unreachable".into()))).boxed()
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Vec<Seat>>,
    generations: HashMap<String, u64>,
}

/// In-process seat cache with the same generation rules as the Redis one.
#[derive(Default)]
pub struct MemorySeatCache {
    state: Mutex<CacheState>,
    pub invalidations: AtomicU32,
}

impl MemorySeatCache {
    pub fn cached(&self, cinema_id: &str) -> Option<Vec<Seat>> {
        self.state.lock().unwrap().entries.get(cinema_id).cloned()
    }

    pub fn invalidations(&self) -> u32 {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl SeatCache for MemorySeatCache {
    fn get_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<Vec<Seat>>> {
        futures::future::ready(self.cached(cinema_id)).boxed()
    }

    fn generation<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<u64>> {
        let generation = self.state.lock().unwrap().generations.get(cinema_id).copied().unwrap_or(0);
        futures::future::ready(Some(generation)).boxed()
    }

    fn save_seats<'a>(&'a self, cinema_id: &'a str, generation: u64, seats: &'a [Seat]) -> BoxFuture<'a, bool> {
        let mut state = self.state.lock().unwrap();
        let current = state.generations.get(cinema_id).copied().unwrap_or(0);
        let saved = current == generation;
        if saved {
            state.entries.insert(cinema_id.to_string(), seats.to_vec());
        }
        futures::future::ready(saved).boxed()
    }

    fn invalidate_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, ()> {
        let mut state = self.state.lock().unwrap();
        *state.generations.entry(cinema_id.to_string()).or_insert(0) += 1;
        state.entries.remove(cinema_id);
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        futures::future::ready(()).boxed()
    }

    fn ping(&self) -> BoxFuture<'_, bool> {
        futures::future::ready(true).boxed()
    }
}

/// A buyer who purchases a seat and invalidates the cache right after a
/// seat map has been read, before the reader gets to refill the cache.
pub struct PurchaseAfterReadStore {
    pub inner: MemorySeatStore,
    cache: Arc<MemorySeatCache>,
    armed: Mutex<Option<i32>>,
}

impl PurchaseAfterReadStore {
    pub fn new(cache: Arc<MemorySeatCache>) -> Self {
        Self {
            inner: MemorySeatStore::new(),
            cache,
            armed: Mutex::new(None),
        }
    }

    /// The next seat map read is followed by a purchase of `seat_number`.
    pub fn arm(&self, seat_number: i32) {
        *self.armed.lock().unwrap() = Some(seat_number);
    }

    async fn read_then_purchase(&self, cinema_id: &str) -> StoreResult<Vec<Seat>> {
        let snapshot = self.inner.list_seats(cinema_id).await?;
        let armed = self.armed.lock().unwrap().take();
        if let Some(seat) = armed.and_then(|n| snapshot.iter().find(|s| s.seat_number == n)) {
            let bought = self
                .inner
                .conditional_claim(seat.id, SeatStatus::Available, SeatStatus::Purchased)
                .await?;
            assert!(bought, "seat {} should have been free", seat.seat_number);
            self.cache.invalidate_seats(cinema_id).await;
        }
        Ok(snapshot)
    }
}

impl SeatStore for PurchaseAfterReadStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.inner.create_cinema(name, seat_count)
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.inner.get_cinema(cinema_id)
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        self.read_then_purchase(cinema_id).boxed()
    }

    fn conditional_claim(&self, seat_id: i64, expected: SeatStatus, new: SeatStatus) -> BoxFuture<'_, StoreResult<bool>> {
        self.inner.conditional_claim(seat_id, expected, new)
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.inner.conditional_claim_all(seat_ids, expected, new)
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.inner.ping()
    }
}
