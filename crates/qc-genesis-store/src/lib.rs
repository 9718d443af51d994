//! # qc-genesis-store
//!
//! Persists an executed genesis as one hashed, multi-section artifact and
//! reads it back.
//!
//! ## Role in System
//!
//! - **Frames** blocks, epochs and state into independently hashed sections
//! - **Bounds** memory by spilling large section payloads to temporary files
//! - **Publishes** the artifact atomically; failures leave nothing behind
//! - **Verifies** artifacts and restores their state for inspection
//!
//! ## Section Lifecycle
//!
//! ```text
//! SectionWriter ──start──→ ActiveSection ──write_*──→ ActiveSection ──flush──→ FlushedSection
//!                               │
//!                               └── I/O, encode or iteration error → poisoned → flush fails
//! ```
//!
//! Each content hash covers the container header, the section kind and
//! index, and the framed payload. Spilling never changes a hash.

pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod reader;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use export::*;
pub use reader::*;
