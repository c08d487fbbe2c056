//! # rollcall Core
//!
//! Canonical record types shared by the rollcall reconciliation engine
//! and its adapters.
//!
//! ## Modules
//!
//! - [`ids`] - Strongly typed identifiers (`MemberId`, `GroupId`)
//! - [`values`] - Validated value objects (`Email`, `Slug`, `ExternalId`, `Source`, `IdSource`)
//! - [`status`] - Record lifecycle statuses
//! - [`member`] / [`group`] - Canonical records and their per-source views
//! - [`envelope`] - The outcome envelope returned by reconciliation
//! - [`error`] - Validation failures
//!
//! ## Example
//!
//! ```
//! use rollcall_core::{Email, ExternalId, Member, MemberSource, MemberStatus, Source};
//!
//! let source_record = MemberSource {
//!     id: ExternalId::parse("S1").unwrap(),
//!     source: Source::Crm,
//!     status: MemberStatus::Active,
//!     name: "Ada Lovelace".to_string(),
//!     email: Email::parse("ada@example.com").unwrap(),
//!     organisation_name: None,
//! };
//!
//! let member = Member::from_source(&source_record);
//! assert!(member.source_id_for(Source::Crm).is_some());
//! // the copies now agree, so a second merge is a no-op
//! assert!(member.apply_source(&source_record).is_none());
//! ```

pub mod envelope;
pub mod error;
pub mod group;
pub mod ids;
pub mod member;
pub mod status;
pub mod values;

// Re-export main types for convenient access
pub use envelope::{OutcomeKind, RecordEvent, UpsertOutcome};
pub use error::{CoreError, CoreResult};
pub use group::{Group, GroupSource, GroupSourceForCreate};
pub use ids::{GroupId, MemberId};
pub use member::{Member, MemberSource, MemberSourceForCreate};
pub use status::{GroupStatus, MemberStatus};
pub use values::{Email, ExternalId, IdSource, Slug, Source, ID_SOURCE_SEPARATOR};
