/// Geolocation instructor search - Gateway
mod search;

pub use search::InstructorSearch;
