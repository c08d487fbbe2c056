//! # rollcall REST sources
//!
//! One generic REST adapter for all of rollcall's external backends.
//! The adapter owns the transport: HTTP client, authentication, and the
//! mapping from response statuses onto the reconciliation error
//! taxonomy. Per-backend differences -- endpoint shapes, native payload
//! schemas, create-time defaults -- live in a small binding value the
//! adapter is parameterized by, so adding a backend means writing a
//! binding, not another adapter.
//!
//! ## Status mapping
//!
//! | response | error |
//! |---|---|
//! | 404 | `NotFound` |
//! | 409 | `Conflict` |
//! | 400/422 on update | `UpdateRejected` |
//! | 401/403 | `Unauthorized` |
//! | 408/429/5xx, connect failure | `SourceUnavailable` |
//!
//! "Record absent" and "backend unreachable" are therefore distinct by
//! construction, which the orchestrator's create branch depends on.
//!
//! ## Example
//!
//! ```no_run
//! use rollcall_source_rest::{AuthBinding, RestMemberSourceRepository, RestSourceConfig, SourceAuth};
//!
//! # fn example() -> Result<(), rollcall_sync::error::SyncError> {
//! let config = RestSourceConfig::new("https://tenant.auth.example.com/api/v2/")
//!     .with_auth(SourceAuth::Bearer { token: "...".to_string() });
//! let adapter = RestMemberSourceRepository::new(AuthBinding::new(), config)?;
//! # let _ = adapter;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod backends;
pub mod binding;
pub mod config;

// Re-export main types for convenient access
pub use adapter::{RestGroupSourceRepository, RestMemberSourceRepository};
pub use backends::{AuthBinding, CommunityBinding, CoursePlatformBinding, CrmBinding};
pub use binding::{Endpoint, GroupSourceBackend, HttpMethod, MemberSourceBackend};
pub use config::{RestSourceConfig, SourceAuth};
