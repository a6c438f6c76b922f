use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{ApiGateway, RetryPolicy};
use crate::cache::{CacheStats, CoordinateKey, QueryCache};
use crate::constants::INSTRUCTOR_SEARCH_ENDPOINT;
use crate::models::{Instructor, SearchParams};
use crate::utils::ApiError;

/// Nearby-instructor lookup with a short-lived cache per position
pub struct InstructorSearch {
    gateway: Arc<ApiGateway>,
    cache: QueryCache<CoordinateKey, Vec<Instructor>>,
    current: Mutex<Vec<Instructor>>,
    default_radius: f64,
    retry: RetryPolicy,
}

impl InstructorSearch {
    pub fn new(
        gateway: Arc<ApiGateway>,
        default_radius: f64,
        freshness: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            cache: QueryCache::new(freshness),
            current: Mutex::new(Vec::new()),
            default_radius,
            retry,
        }
    }

    /// Search around the given position.
    ///
    /// Without both coordinates nothing is sent and the last result (empty
    /// before the first search) is returned unchanged.
    pub async fn search(&self, params: SearchParams) -> Result<Vec<Instructor>, ApiError> {
        let Some((latitude, longitude)) = params.coordinates() else {
            debug!("Instructor search skipped, position incomplete");
            return Ok(self.current());
        };
        let radius = params.radius_or_default(self.default_radius);
        let key = CoordinateKey::new(latitude, longitude, radius);

        if let Some(cached) = self.cache.get_fresh(&key) {
            debug!("Instructor search served from cache");
            *self.current.lock() = cached.clone();
            return Ok(cached);
        }

        let query = vec![
            ("latitude".to_string(), latitude.to_string()),
            ("longitude".to_string(), longitude.to_string()),
            ("radius".to_string(), radius.to_string()),
        ];
        let found: Vec<Instructor> = self
            .gateway
            .query(INSTRUCTOR_SEARCH_ENDPOINT, &query, &self.retry)
            .await?;
        info!(
            "Found {} instructors within {} km of ({}, {})",
            found.len(),
            radius,
            latitude,
            longitude
        );

        let evicted = self.cache.evict_stale();
        if evicted > 0 {
            debug!("Evicted {} stale search results", evicted);
        }
        self.cache.insert(key, found.clone());
        *self.current.lock() = found.clone();
        Ok(found)
    }

    /// Result of the last successful search
    pub fn current(&self) -> Vec<Instructor> {
        self.current.lock().clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
