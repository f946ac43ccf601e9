//! Scheduled self-reflection bookkeeping.

pub mod model;
pub mod repository;

pub use model::{ReflectionTracker, DEFAULT_REFLECTION_INTERVAL};
pub use repository::ReflectionTrackerRepository;
