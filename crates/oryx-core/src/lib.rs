//! Foundational utilities shared across Oryx bot crates.
//!
//! Provides atomic file-write helpers, unix-time window checks, and the
//! append-only interaction/audit sinks used by the message pipeline.

pub mod atomic_io;
pub mod audit_log;
pub mod interaction_log;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use audit_log::AuditLog;
pub use interaction_log::{InteractionLog, InteractionRecord};
pub use time_utils::{current_unix_timestamp_ms, within_window_ms};
