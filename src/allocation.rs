//! Выбор мест по снимку зала.
//!
//! Чистые функции без побочных эффектов: решают, какое место (или пару мест)
//! пытаться занять. Само занятие делает координатор через условную запись.

use crate::models::{Seat, SeatMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatDecision<'a> {
    Eligible(&'a Seat),
    CinemaNotFound,
    SeatNotFound,
    AlreadyTaken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairDecision<'a> {
    Eligible(&'a Seat, &'a Seat),
    CinemaNotFound,
    NoPairAvailable,
}

/// Можно ли занять место `seat_number`. `None` вместо снимка значит, что зала нет.
pub fn select_seat(snapshot: Option<&SeatMap>, seat_number: i32) -> SeatDecision<'_> {
    let Some(map) = snapshot else {
        return SeatDecision::CinemaNotFound;
    };

    match map.seats.iter().find(|s| s.seat_number == seat_number) {
        None => SeatDecision::SeatNotFound,
        Some(seat) if seat.is_available() => SeatDecision::Eligible(seat),
        Some(_) => SeatDecision::AlreadyTaken,
    }
}

/// Первая по номеру пара соседних свободных мест (N, N+1).
///
/// Один проход по местам, отсортированным по номеру; останавливается на
/// первом совпадении. Никаких эвристик "лучшей" пары: выигрывает самая левая.
pub fn select_first_pair(snapshot: Option<&SeatMap>) -> PairDecision<'_> {
    let Some(map) = snapshot else {
        return PairDecision::CinemaNotFound;
    };

    map.seats
        .windows(2)
        .find(|w| {
            w[0].is_available()
                && w[1].is_available()
                && w[1].seat_number == w[0].seat_number + 1
        })
        .map(|w| PairDecision::Eligible(&w[0], &w[1]))
        .unwrap_or(PairDecision::NoPairAvailable)
}
