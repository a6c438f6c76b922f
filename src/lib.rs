pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod constants;
pub mod instructors;
pub mod models;
pub mod rides;
pub mod session;
pub mod storage;
pub mod utils;

pub use api::{ApiGateway, ReqwestTransport, Transport};
pub use app::{load_config, AppState, Config};
pub use instructors::InstructorSearch;
pub use rides::RideService;
pub use session::{Session, SessionHandle, SessionStore};
pub use utils::{ApiError, SessionError};
