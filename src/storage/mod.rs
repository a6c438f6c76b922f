/// Device-local persistence - Gateway
mod local;

pub use local::LocalStorage;
