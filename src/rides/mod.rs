/// Lesson scheduling module - Gateway
mod service;

pub use service::RideService;
