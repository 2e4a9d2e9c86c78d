use futures::future::BoxFuture;

use crate::models::Seat;

pub mod seats;

pub use seats::RedisSeatCache;

/// Кеш карт мест. Только для чтения клиентами: координатор решает по данным
/// хранилища, поэтому устаревший кеш не может привести к двойной продаже.
///
/// Заполнение защищено поколением: читатель берет номер поколения до чтения
/// хранилища, а `save_seats` пишет, только если поколение не сменилось.
/// `invalidate_seats` сдвигает поколение, так что снимок, прочитанный до
/// покупки, уже не попадет в кеш после инвалидации.
///
/// Сбои кеша наружу не выходят: промах и ошибка выглядят одинаково.
pub trait SeatCache: Send + Sync {
    fn get_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<Vec<Seat>>>;

    /// Текущее поколение карты зала. `None`, если кеш недоступен.
    fn generation<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<u64>>;

    /// Кладет карту, если поколение все еще `generation`. Возвращает, записано ли.
    fn save_seats<'a>(&'a self, cinema_id: &'a str, generation: u64, seats: &'a [Seat]) -> BoxFuture<'a, bool>;

    fn invalidate_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, ()>;

    fn ping(&self) -> BoxFuture<'_, bool>;
}
