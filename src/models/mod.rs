pub mod cinema;
pub mod commands;
pub mod seat;

pub use cinema::Cinema;
pub use commands::{ClaimPair, ClaimSeat, NewCinema, MAX_SEATS};
pub use seat::{Seat, SeatMap, SeatStatus};
