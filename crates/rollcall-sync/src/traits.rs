//! Repository traits
//!
//! The uniform contract for locating, creating and updating records at
//! any backend. Source repositories face the external systems; the
//! member/group repositories face the canonical store. All operations
//! return a typed failure rather than panicking or throwing for
//! expected conditions: a successful round trip with no match is
//! `NotFound`, a payload that fails validation is `SourceInvalid`.

use async_trait::async_trait;

use rollcall_core::{
    ExternalId, Group, GroupSource, GroupSourceForCreate, Member, MemberSource,
    MemberSourceForCreate, Source,
};

use crate::error::{SyncError, SyncResult};
use crate::identifier::{
    GroupIdentifier, GroupSourceIdentifier, MemberIdentifier, MemberSourceIdentifier,
};

/// A member repository at one external source system.
#[async_trait]
pub trait MemberSourceRepository: Send + Sync {
    /// The constant source key this adapter represents, used by the
    /// orchestrator to route.
    fn source(&self) -> Source;

    /// Look up one member at the backend.
    ///
    /// `Err(NotFound)` when the round trip succeeds with no match;
    /// `Err(SourceInvalid)` when the payload fails validation;
    /// `Err(UnsupportedIdentifier)` for a kind this backend cannot
    /// serve.
    async fn find_one(&self, identifier: &MemberSourceIdentifier) -> SyncResult<MemberSource>;

    /// Create a member at the backend.
    ///
    /// Backend-specific defaults (passwords, roles, connection names)
    /// are injected here, never by the orchestrator.
    async fn create(&self, member: &MemberSourceForCreate) -> SyncResult<MemberSource>;

    /// Update a member at the backend.
    async fn update(&self, member: &MemberSource) -> SyncResult<MemberSource>;

    /// Delete a member at the backend. Not all backends allow it.
    async fn delete(&self, id: &ExternalId) -> SyncResult<()> {
        let _ = id;
        Err(SyncError::unsupported_operation(self.source(), "delete"))
    }
}

/// A group repository at one external source system.
#[async_trait]
pub trait GroupSourceRepository: Send + Sync {
    /// The constant source key this adapter represents.
    fn source(&self) -> Source;

    /// Look up one group at the backend.
    async fn find_one(&self, identifier: &GroupSourceIdentifier) -> SyncResult<GroupSource>;

    /// Create a group at the backend.
    async fn create(&self, group: &GroupSourceForCreate) -> SyncResult<GroupSource>;

    /// Update a group at the backend.
    async fn update(&self, group: &GroupSource) -> SyncResult<GroupSource>;

    /// Delete a group at the backend. Not all backends allow it.
    async fn delete(&self, id: &ExternalId) -> SyncResult<()> {
        let _ = id;
        Err(SyncError::unsupported_operation(self.source(), "delete"))
    }
}

/// The canonical member store.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Look up one member. `Err(NotFound)` when absent.
    async fn find_one(&self, identifier: &MemberIdentifier) -> SyncResult<Member>;

    /// Check whether a member exists. Never `NotFound`-errors.
    async fn check(&self, identifier: &MemberIdentifier) -> SyncResult<bool>;

    /// Create or replace a member. The store is a document store; the
    /// whole record is written.
    async fn save(&self, member: &Member) -> SyncResult<Member>;
}

/// The canonical group store.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Look up one group. `Err(NotFound)` when absent.
    async fn find_one(&self, identifier: &GroupIdentifier) -> SyncResult<Group>;

    /// Check whether a group exists. Never `NotFound`-errors.
    async fn check(&self, identifier: &GroupIdentifier) -> SyncResult<bool>;

    /// Create or replace a group.
    async fn save(&self, group: &Group) -> SyncResult<Group>;
}
