use futures::future::BoxFuture;
use futures::FutureExt;
use redis::{AsyncCommands, Script};
use tracing::{debug, warn};

use crate::cache::SeatCache;
use crate::models::Seat;
use crate::redis_client::RedisClient;

// SET только при совпадении поколения, проверка и запись в одном скрипте
const SAVE_IF_GENERATION: &str = r#"
if (redis.call('GET', KEYS[2]) or '0') == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
end
return 0
"#;

fn seats_key(cinema_id: &str) -> String {
    format!("seats:{}", cinema_id)
}

fn generation_key(cinema_id: &str) -> String {
    format!("seats:{}:gen", cinema_id)
}

#[derive(Clone)]
pub struct RedisSeatCache {
    redis: RedisClient,
    seat_ttl_seconds: u64,
    save_script: Script,
}

impl RedisSeatCache {
    pub fn new(redis: RedisClient, seat_ttl_seconds: u64) -> Self {
        Self {
            redis,
            seat_ttl_seconds,
            save_script: Script::new(SAVE_IF_GENERATION),
        }
    }

    async fn read_seats(&self, cinema_id: &str) -> Option<Vec<Seat>> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = match conn.get(seats_key(cinema_id)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("seat cache read failed for cinema {}: {:?}", cinema_id, e);
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(seats) => Some(seats),
            Err(e) => {
                warn!("seat cache entry for cinema {} is unreadable: {}", cinema_id, e);
                None
            }
        }
    }

    async fn read_generation(&self, cinema_id: &str) -> Option<u64> {
        let mut conn = self.redis.conn.clone();
        let generation: redis::RedisResult<Option<u64>> = conn.get(generation_key(cinema_id)).await;
        match generation {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                warn!("seat cache generation read failed for cinema {}: {:?}", cinema_id, e);
                None
            }
        }
    }

    async fn write_seats(&self, cinema_id: &str, generation: u64, seats: &[Seat]) -> bool {
        let data = match serde_json::to_string(seats) {
            Ok(data) => data,
            Err(e) => {
                warn!("failed to serialize seats for cinema {}: {}", cinema_id, e);
                return false;
            }
        };

        let mut conn = self.redis.conn.clone();
        let saved: redis::RedisResult<i32> = self
            .save_script
            .key(seats_key(cinema_id))
            .key(generation_key(cinema_id))
            .arg(generation)
            .arg(data)
            .arg(self.seat_ttl_seconds)
            .invoke_async(&mut conn)
            .await;

        match saved {
            Ok(1) => true,
            Ok(_) => {
                debug!("seat map for cinema {} changed while loading, not cached", cinema_id);
                false
            }
            Err(e) => {
                warn!("seat cache write failed for cinema {}: {:?}", cinema_id, e);
                false
            }
        }
    }

    async fn drop_seats(&self, cinema_id: &str) {
        let mut conn = self.redis.conn.clone();
        let result: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .incr(generation_key(cinema_id), 1)
            .ignore()
            .del(seats_key(cinema_id))
            .ignore()
            .query_async(&mut conn)
            .await;
        match result {
            Ok(()) => debug!("Invalidated seats cache for cinema {}", cinema_id),
            Err(e) => warn!("failed to invalidate seats cache for cinema {}: {:?}", cinema_id, e),
        }
    }

    async fn check(&self) -> bool {
        match self.redis.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis ping failed: {:?}", e);
                false
            }
        }
    }
}

impl SeatCache for RedisSeatCache {
    fn get_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<Vec<Seat>>> {
        self.read_seats(cinema_id).boxed()
    }

    fn generation<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, Option<u64>> {
        self.read_generation(cinema_id).boxed()
    }

    fn save_seats<'a>(&'a self, cinema_id: &'a str, generation: u64, seats: &'a [Seat]) -> BoxFuture<'a, bool> {
        self.write_seats(cinema_id, generation, seats).boxed()
    }

    fn invalidate_seats<'a>(&'a self, cinema_id: &'a str) -> BoxFuture<'a, ()> {
        self.drop_seats(cinema_id).boxed()
    }

    fn ping(&self) -> BoxFuture<'_, bool> {
        self.check().boxed()
    }
}
