use std::time::Instant;

/// Key for a coordinate query. Floats are keyed by their bit pattern, so
/// the exact same request maps to the same entry.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CoordinateKey {
    latitude: u64,
    longitude: u64,
    radius: u64,
}

impl CoordinateKey {
    pub fn new(latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            latitude: normalize(latitude).to_bits(),
            longitude: normalize(longitude).to_bits(),
            radius: normalize(radius).to_bits(),
        }
    }
}

// -0.0 and 0.0 are the same position
fn normalize(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Cache entry with the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub stored_at: Instant,
}
