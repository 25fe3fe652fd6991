use cache::CacheBackend;
use config::Config;
use sqlx::SqlitePool;

pub mod assessment;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod result;
pub mod router;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub cache: CacheBackend,
}
