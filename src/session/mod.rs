/// Session management module - Gateway

mod handle;
mod persist;
mod state;
mod store;

pub use handle::SessionHandle;
pub use state::{PersistedSession, Session};
pub use store::SessionStore;
