//! Persona documents ("SOUL") and their locked-section rules.

pub mod document;
pub mod repository;

pub use document::{
    extract_revision, locked_section, restore_locked_section, LOCKED_HEADING, REVISION_CLOSE_TAG,
    REVISION_OPEN_TAG,
};
pub use repository::{PersonaStore, VersionSummary};
