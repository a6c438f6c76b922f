use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiGateway, RetryPolicy, SessionAccess};
use crate::cache::QueryCache;
use crate::constants::RIDES_ENDPOINT;
use crate::models::{NewRide, Ride};
use crate::utils::ApiError;

/// Lesson scheduling for the signed-in student.
///
/// Listings are cached per bearer token, so a sign-out by any path (logout
/// or a 401) never lets one account see another's rides.
pub struct RideService {
    gateway: Arc<ApiGateway>,
    session: Arc<dyn SessionAccess>,
    cache: QueryCache<Option<String>, Vec<Ride>>,
    retry: RetryPolicy,
}

impl RideService {
    pub fn new(
        gateway: Arc<ApiGateway>,
        session: Arc<dyn SessionAccess>,
        stale_after: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            session,
            cache: QueryCache::new(stale_after),
            retry,
        }
    }

    /// The caller's rides, from cache while fresh
    pub async fn list(&self) -> Result<Vec<Ride>, ApiError> {
        let key = self.session.bearer_token();
        if let Some(cached) = self.cache.get_fresh(&key) {
            return Ok(cached);
        }

        let rides: Vec<Ride> = self.gateway.query(RIDES_ENDPOINT, &[], &self.retry).await?;
        self.cache.evict_stale();
        // Store under the token the request went out with
        self.cache.insert(key, rides.clone());
        Ok(rides)
    }

    /// Book a lesson. Not retried.
    pub async fn book(&self, ride: &NewRide) -> Result<Ride, ApiError> {
        let booked: Ride = self.gateway.post_json(RIDES_ENDPOINT, ride).await?;
        info!(
            "Booked ride {} with instructor {} at {}",
            booked.id, booked.instructor_id, booked.scheduled_at
        );
        self.invalidate();
        Ok(booked)
    }

    /// Force the next `list` to hit the server
    pub fn invalidate(&self) {
        self.cache.invalidate(&self.session.bearer_token());
    }

    /// Forget everything cached for the current account
    pub fn reset(&self) {
        self.cache.clear();
    }
}
