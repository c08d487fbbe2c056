//! Identifier dispatch
//!
//! Closed sum types naming every way a record can be located, one per
//! lookup surface. Each adapter dispatches with an exhaustive `match`,
//! so an adapter that claims a kind must handle it; a kind an adapter
//! genuinely cannot serve is `SyncError::UnsupportedIdentifier`, a
//! configuration error distinct from `NotFound`.

use std::fmt;

use rollcall_core::{Email, ExternalId, GroupId, IdSource, MemberId, Slug};

/// Ways to locate a member in the canonical store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberIdentifier {
    /// By canonical id.
    Id(MemberId),
    /// By the id recorded for one external source.
    SourceIdValue(IdSource),
    /// By email.
    Email(Email),
}

impl MemberIdentifier {
    /// The kind name, for diagnostics and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MemberIdentifier::Id(_) => "id",
            MemberIdentifier::SourceIdValue(_) => "id-source-value",
            MemberIdentifier::Email(_) => "email",
        }
    }
}

impl fmt::Display for MemberIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberIdentifier::Id(id) => write!(f, "{id}"),
            MemberIdentifier::SourceIdValue(id_source) => write!(f, "{id_source}"),
            MemberIdentifier::Email(email) => write!(f, "{email}"),
        }
    }
}

/// Ways to locate a member at an external source.
///
/// When both are available, `SourceId` always takes priority over
/// `Email`; email is the fallback for a source that has not assigned an
/// id yet. Reversing this would create duplicate external accounts for
/// a member whose email changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSourceIdentifier {
    /// By the id the source assigned.
    SourceId(ExternalId),
    /// By email.
    Email(Email),
}

impl MemberSourceIdentifier {
    /// The kind name, for diagnostics and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MemberSourceIdentifier::SourceId(_) => "source-id",
            MemberSourceIdentifier::Email(_) => "email",
        }
    }
}

impl fmt::Display for MemberSourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberSourceIdentifier::SourceId(id) => write!(f, "{id}"),
            MemberSourceIdentifier::Email(email) => write!(f, "{email}"),
        }
    }
}

/// Ways to locate a group in the canonical store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupIdentifier {
    /// By canonical id.
    Id(GroupId),
    /// By the id recorded for one external source.
    SourceIdValue(IdSource),
    /// By slug.
    Slug(Slug),
}

impl GroupIdentifier {
    /// The kind name, for diagnostics and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupIdentifier::Id(_) => "id",
            GroupIdentifier::SourceIdValue(_) => "id-source-value",
            GroupIdentifier::Slug(_) => "slug",
        }
    }
}

impl fmt::Display for GroupIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupIdentifier::Id(id) => write!(f, "{id}"),
            GroupIdentifier::SourceIdValue(id_source) => write!(f, "{id_source}"),
            GroupIdentifier::Slug(slug) => write!(f, "{slug}"),
        }
    }
}

/// Ways to locate a group at an external source.
///
/// `SourceId` takes priority over `Slug`, for the same duplicate-account
/// reason as members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSourceIdentifier {
    /// By the id the source assigned.
    SourceId(ExternalId),
    /// By slug.
    Slug(Slug),
}

impl GroupSourceIdentifier {
    /// The kind name, for diagnostics and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupSourceIdentifier::SourceId(_) => "source-id",
            GroupSourceIdentifier::Slug(_) => "slug",
        }
    }
}

impl fmt::Display for GroupSourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSourceIdentifier::SourceId(id) => write!(f, "{id}"),
            GroupSourceIdentifier::Slug(slug) => write!(f, "{slug}"),
        }
    }
}
