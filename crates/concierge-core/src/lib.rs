//! concierge-core - Core library for the travel concierge
//!
//! This crate provides shared functionality between the concierge CLI and
//! concierge-server:
//!
//! - **types**: Profile, memory note and trip history documents
//! - **storage**: Per-user JSON state documents
//! - **memory**: Note editing, prompt rendering and consolidation
//! - **pricing**: Flight/hotel price lookups (feature `pricing`)
//! - **auth**: Local accounts and session tokens
//! - **logs**: Log file inspection
//! - **config**: File/environment configuration

pub mod auth;
pub mod config;
pub mod error;
pub mod logs;
pub mod memory;
#[cfg(feature = "pricing")]
pub mod pricing;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use storage::{JsonStateStore, StateStore};
pub use types::{MemoryNote, MemoryScope, Profile, UserState};
