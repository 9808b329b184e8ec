use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cache::PageCache;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub page_cache: Arc<PageCache>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let page_cache = Arc::new(PageCache::new(config.index_ttl(), config.cache_capacity()));
        Self {
            db,
            config,
            page_cache,
        }
    }
}
