use validator::{Validate, ValidationError};

pub const MAX_SEAT_NUMBER: i64 = i32::MAX as i64;

/// Потолок размера зала: все места создаются одной вставкой и целиком
/// держатся в снимке, поэтому размер ограничен сверху.
pub const MAX_SEATS: i64 = 100_000;

#[derive(Debug, Clone, Validate)]
pub struct NewCinema {
    #[validate(custom(function = "not_blank", message = "Cinema name is required and cannot be empty."))]
    pub name: String,
    #[validate(
        range(min = 1, message = "Invalid number of seats. Must be a positive integer."),
        custom(function = "within_seat_cap", message = "Too many seats. A cinema can have at most 100000 seats.")
    )]
    pub seat_count: i64,
}

#[derive(Debug, Clone, Validate)]
pub struct ClaimSeat {
    #[validate(custom(function = "not_blank", message = "Cinema ID is required and cannot be empty."))]
    pub cinema_id: String,
    #[validate(range(min = 1, max = MAX_SEAT_NUMBER, message = "Invalid seat number. Must be a positive integer."))]
    pub seat_number: i64,
}

#[derive(Debug, Clone, Validate)]
pub struct ClaimPair {
    #[validate(custom(function = "not_blank", message = "Cinema ID is required and cannot be empty."))]
    pub cinema_id: String,
}

fn within_seat_cap(value: i64) -> Result<(), ValidationError> {
    if value > MAX_SEATS {
        return Err(ValidationError::new("too_many_seats"));
    }
    Ok(())
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
