// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod auth;
mod instructor;
mod ride;

// Public re-exports - the ONLY way to access API data types
pub use auth::{Credentials, Profile, RegistrationRequest, Role, TokenResponse};
pub use instructor::{Instructor, SearchParams};
pub use ride::{parse_timestamp, NewRide, Ride, RideStatus};
