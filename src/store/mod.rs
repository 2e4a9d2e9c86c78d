//! Контракт хранилища мест.
//!
//! Координатор получает хранилище как `Arc<dyn SeatStore>`, поэтому методы
//! возвращают `BoxFuture`. Единственный способ изменить статус места —
//! условная запись (`conditional_claim*`), обычного UPDATE в контракте нет.

use futures::future::BoxFuture;

use crate::error::StoreError;
use crate::models::{Cinema, Seat, SeatStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemorySeatStore;
pub use postgres::PgSeatStore;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait SeatStore: Send + Sync {
    /// Создает зал и места `1..=seat_count` со статусом `available` одной
    /// атомарной операцией: частично созданный зал не виден никогда.
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>>;

    /// `None`, если зала нет (в том числе для некорректного id).
    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>>;

    /// Места зала по возрастанию номера.
    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>>;

    /// Атомарно переводит место в `new` только если текущий статус равен
    /// `expected`. Возвращает, произошел ли переход.
    fn conditional_claim(
        &self,
        seat_id: i64,
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'_, StoreResult<bool>>;

    /// Групповой вариант: все места переходят в `new`, либо ни одно.
    /// `true` только если условие выполнилось для каждого id.
    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>>;

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;
}
