/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 10;

// Endpoints
pub const TOKEN_ENDPOINT: &str = "/login/access-token";
pub const PROFILE_ENDPOINT: &str = "/users/me";
pub const USERS_ENDPOINT: &str = "/users/";
pub const INSTRUCTOR_SEARCH_ENDPOINT: &str = "/instructors/search";
pub const RIDES_ENDPOINT: &str = "/rides/";

// Instructor search
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;
pub const SEARCH_FRESHNESS_SECS: u64 = 60;

// Query behaviour
pub const QUERY_STALE_SECS: u64 = 300;
pub const QUERY_RETRIES: u32 = 2;
pub const QUERY_RETRY_BASE_DELAY_MS: u64 = 1000;
pub const QUERY_RETRY_MAX_DELAY_MS: u64 = 30_000;

// Persistence
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

// User-facing fallback messages
pub const SIGN_IN_FALLBACK_MESSAGE: &str = "Unable to sign in. Check your credentials.";
pub const SIGN_UP_FALLBACK_MESSAGE: &str = "Unable to create account. Try another email.";
