//! # rollcall Sync
//!
//! The multi-source reconciliation engine: a uniform contract for
//! locating a record at any backend by any identifier kind, the
//! find-or-create-or-update orchestration that keeps an external source
//! and the canonical store convergent, and the result pipeline that
//! gives the orchestration its partial-failure guarantees.
//!
//! ## Architecture
//!
//! - [`traits`] - Repository contracts for source systems and the store
//! - [`identifier`] - Closed identifier sum types, one per lookup surface
//! - [`pipeline`] - `Result` combinators: action-context tagging and
//!   recovery of specific error kinds into fallback values
//! - [`member_sync`] / [`group_sync`] - The upsert state machines
//! - [`multi`] - Fan-out of one record to many sources
//! - [`config`] - Explicit engine configuration
//! - [`error`] - The error taxonomy the orchestrator branches on
//! - [`testing`] - In-memory fakes with call counters
//!
//! ## Guarantees
//!
//! The engine never retries; it is designed to be retried by its caller
//! (typically a queue redelivering a message). Idempotency is structural:
//! lookup-before-write, a no-change short-circuit that skips the write
//! entirely, and rejected updates swallowed into a failure outcome so
//! redelivery converges instead of looping.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rollcall_core::Source;
//! use rollcall_sync::config::SyncConfig;
//! use rollcall_sync::member_sync::{MemberSync, UpsertMemberRequest};
//! use rollcall_sync::testing::{FakeMemberRepository, FakeMemberSourceRepository};
//!
//! # async fn example() -> Result<(), rollcall_sync::error::SyncError> {
//! let store = Arc::new(FakeMemberRepository::new());
//! let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
//!
//! let engine = MemberSync::new(SyncConfig::default(), store)?.with_source(crm);
//!
//! let outcome = engine
//!     .upsert_member(&UpsertMemberRequest {
//!         source: Source::Crm,
//!         id_source_value: Some("crm#S1".to_string()),
//!         email: None,
//!     })
//!     .await?;
//! println!("{} ({})", outcome.event, outcome.outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod group_sync;
pub mod identifier;
pub mod member_sync;
pub mod multi;
pub mod pipeline;
pub mod testing;
pub mod traits;

// Re-export main types for convenient access
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use group_sync::{CreateGroupRequest, GroupRef, GroupSync, UpsertGroupRequest};
pub use identifier::{
    GroupIdentifier, GroupSourceIdentifier, MemberIdentifier, MemberSourceIdentifier,
};
pub use member_sync::{CreateMemberRequest, MemberRef, MemberSync, UpsertMemberRequest};
pub use multi::{FanOutSummary, MultiSourceReport, SourceFailure, SourceOutcome};
pub use pipeline::ResultExt;
pub use traits::{
    GroupRepository, GroupSourceRepository, MemberRepository, MemberSourceRepository,
};
