//! # shmcast - keyed byte assets over System V shared memory
//!
//! shmcast publishes a key→bytes mapping into a named shared memory
//! segment so that unrelated reader processes can pick it up without a
//! socket or file channel. A long-lived publisher assembles the mapping
//! from files and command output, encodes it into one flat buffer, writes
//! the buffer into a segment, and then waits for signals: SIGHUP replaces
//! the segment, SIGINT/SIGTERM tear it down.
//!
//! ## Architecture
//!
//! ```text
//! publisher process                          reader processes
//! ┌──────────────────────────────────┐       ┌─────────────────────┐
//! │ DataSource ─▶ codec ─▶ Segment-  │  shm  │ SegmentManager      │
//! │ (files,       (framed) Manager ──┼──────▶│  ─▶ codec ─▶ map    │
//! │  commands)                       │       │     (decode)        │
//! │        ▲                         │       └─────────────────────┘
//! │  LifecycleController ◀── signals │
//! └──────────────────────────────────┘
//! ```
//!
//! Publisher and readers never exchange the segment identity; each side
//! derives it independently from a shared anchor file and project id, the
//! way `ftok(3)` does.
//!
//! ## Consistency model
//!
//! The segment is replaced, never resized in place: a reload deletes the
//! old segment and creates a fresh one sized for the new payload. There is
//! deliberately no locking or versioning layer between the single writer
//! and its readers; a reader racing that window may see a missing segment
//! or a torn payload, and treats any decode failure as "retry later".

pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod reader;
pub mod segment;
pub mod source;

pub use codec::{AssetMap, AssetRecords, Strategy};
pub use config::{DataConfig, FilterMode, PublisherConfig, Settings};
pub use error::{Result, ShmCastError};
pub use lifecycle::{Intent, IntentSource, LifecycleController, LifecycleState, SignalIntents};
pub use reader::SegmentReader;
pub use segment::{SegmentHandle, SegmentKey, SegmentManager};
pub use source::{AssetSource, DataSource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
