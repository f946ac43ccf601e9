//! File-backed persistence for the Hearth engine.
//!
//! Everything lives under a single data root (see [`paths::HearthPaths`]).
//! Repositories implement the traits defined in `hearth-core` using
//! plain JSON and markdown files.

pub mod file_activity_log;
pub mod file_persona_store;
pub mod json_chat_repository;
pub mod json_resume_repository;
pub mod json_tracker_repository;
pub mod paths;
pub mod storage;
pub mod version_history;

pub use file_activity_log::FileActivityLog;
pub use file_persona_store::FilePersonaStore;
pub use json_chat_repository::JsonChatRepository;
pub use json_resume_repository::JsonSessionResumeRepository;
pub use json_tracker_repository::JsonReflectionTrackerRepository;
pub use paths::HearthPaths;
