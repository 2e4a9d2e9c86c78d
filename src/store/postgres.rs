use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Cinema, Seat, SeatStatus};
use crate::store::{SeatStore, StoreResult};

// Строка из БД, статус хранится как TEXT
#[derive(FromRow)]
struct SeatRow {
    id: i64,
    cinema_id: String,
    seat_number: i32,
    status: String,
}

impl TryFrom<SeatRow> for Seat {
    type Error = StoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::CorruptRow)?;
        Ok(Seat {
            id: row.id,
            cinema_id: row.cinema_id,
            seat_number: row.seat_number,
            status,
        })
    }
}

#[derive(Clone)]
pub struct PgSeatStore {
    pool: PgPool,
}

impl PgSeatStore {
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }
}

impl PgSeatStore {
    async fn insert_cinema(&self, name: &str, seat_count: i32) -> StoreResult<Cinema> {
        let mut tx = self.pool.begin().await?;

        let cinema = sqlx::query_as::<_, Cinema>(
            "INSERT INTO cinemas (id, name, seat_count)
             VALUES ($1, $2, $3)
             RETURNING id, name, seat_count, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(name)
        .bind(seat_count)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO seats (cinema_id, seat_number, status)
             SELECT $1, n, 'available' FROM generate_series(1, $2) AS n",
        )
        .bind(&cinema.id)
        .bind(seat_count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("cinema {} created with {} seats", cinema.id, seat_count);
        Ok(cinema)
    }

    async fn fetch_cinema(&self, cinema_id: &str) -> StoreResult<Option<Cinema>> {
        let cinema = sqlx::query_as::<_, Cinema>(
            "SELECT id, name, seat_count, created_at FROM cinemas WHERE id = $1",
        )
        .bind(cinema_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cinema)
    }

    async fn fetch_seats(&self, cinema_id: &str) -> StoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT id, cinema_id, seat_number, status
             FROM seats
             WHERE cinema_id = $1
             ORDER BY seat_number ASC",
        )
        .bind(cinema_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn update_status_if(&self, seat_id: i64, expected: SeatStatus, new: SeatStatus) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE seats SET status = $3 WHERE id = $1 AND status = $2")
            .bind(seat_id)
            .bind(expected.as_str())
            .bind(new.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_all_status_if(&self, seat_ids: &[i64], expected: SeatStatus, new: SeatStatus) -> StoreResult<bool> {
        let ids: Vec<i64> = seat_ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ids.is_empty() {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        // одно условное обновление на все места; фиксируем только если
        // условие выполнилось для каждого
        let result = sqlx::query("UPDATE seats SET status = $3 WHERE id = ANY($1) AND status = $2")
            .bind(ids.as_slice())
            .bind(expected.as_str())
            .bind(new.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == ids.len() as u64 {
            tx.commit().await?;
            return Ok(true);
        }

        debug!(
            "batch claim matched {} of {} seats, rolling back",
            result.rows_affected(),
            ids.len()
        );
        tx.rollback().await?;
        Ok(false)
    }

    async fn select_one(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl SeatStore for PgSeatStore {
    fn create_cinema<'a>(&'a self, name: &'a str, seat_count: i32) -> BoxFuture<'a, StoreResult<Cinema>> {
        self.insert_cinema(name, seat_count).boxed()
    }

    fn get_cinema<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Option<Cinema>>> {
        self.fetch_cinema(cinema_id).boxed()
    }

    fn list_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, StoreResult<Vec<Seat>>> {
        self.fetch_seats(cinema_id).boxed()
    }

    fn conditional_claim(
        &self,
        seat_id: i64,
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'_, StoreResult<bool>> {
        self.update_status_if(seat_id, expected, new).boxed()
    }

    fn conditional_claim_all<'a>(
        &'a self,
        seat_ids: &'a [i64],
        expected: SeatStatus,
        new: SeatStatus,
    ) -> BoxFuture<'a, StoreResult<bool>> {
        self.update_all_status_if(seat_ids, expected, new).boxed()
    }

    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        self.select_one().boxed()
    }
}
