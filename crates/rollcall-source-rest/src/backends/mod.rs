//! Concrete backend bindings.

mod auth;
mod community;
mod course_platform;
mod crm;

pub use auth::AuthBinding;
pub use community::CommunityBinding;
pub use course_platform::CoursePlatformBinding;
pub use crm::CrmBinding;

use rollcall_core::{GroupStatus, MemberStatus, Source};
use rollcall_sync::error::{SyncError, SyncResult};

/// A payload that fails the backend's schema contract.
pub(crate) fn invalid(source: Source, message: impl std::fmt::Display) -> SyncError {
    SyncError::source_invalid(source, message.to_string())
}

/// Parse an optional member status field: absent means the backend does
/// not track it (default applies); present but unknown is a contract
/// violation.
pub(crate) fn parse_member_status(
    source: Source,
    value: Option<&str>,
) -> SyncResult<MemberStatus> {
    match value {
        None => Ok(MemberStatus::default()),
        Some(raw) => raw.parse().map_err(|e| invalid(source, e)),
    }
}

/// Parse an optional group status field, same contract as members.
pub(crate) fn parse_group_status(source: Source, value: Option<&str>) -> SyncResult<GroupStatus> {
    match value {
        None => Ok(GroupStatus::default()),
        Some(raw) => raw.parse().map_err(|e| invalid(source, e)),
    }
}
