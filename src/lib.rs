//! Bluecarbon Registry - Registration intake for coastal restoration projects
//!
//! Accepts restoration-project registrations for a blue-carbon MRV registry
//! from two submitter classes - individual/community ("Local") and formal
//! organizations ("Organization") - validates them against domain rules,
//! and persists them as pending records for later human verification.
//!
//! ## Architecture
//!
//! - **Client side**: draft store + debounced autosave, pure validation
//!   rule engine, submission assembler, single-flight submit guard
//! - **Server side**: multipart intake endpoint, server-trusted
//!   re-validation, content-addressed evidence blob store, atomic SQLite
//!   transaction producing one pending submission record
//! - **Dormant**: canonical serialization + SHA-256 digest, to be anchored
//!   behind the admin verify transition in a later milestone
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/bluecarbon-registry/
//! ├── blobs/          # Content-addressed evidence bytes
//! ├── registry.db     # Submission records (SQLite)
//! ├── drafts.sled/    # Draft autosave area
//! └── config.toml     # Configuration
//! ```

// Core modules
pub mod assemble;
pub mod autosave;
pub mod blob_store;
pub mod capabilities;
pub mod config;
pub mod db;
pub mod digest;
pub mod draft;
pub mod error;
pub mod evidence;
pub mod gateway;
pub mod http;
pub mod multipart;
pub mod signature;
pub mod submit;
pub mod validate;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-exports
pub use autosave::{DraftArea, DraftAutosave};
pub use blob_store::BlobStore;
pub use config::Config;
pub use db::RegistryDb;
pub use draft::{DraftStore, ProjectDraft, Variant};
pub use error::RegistryError;
pub use evidence::{EvidenceBundle, EvidenceCategory, EvidenceFile};
pub use gateway::{Gateway, IntakeResponse};
pub use http::HttpServer;
pub use validate::{validate, ValidationErrorMap};
