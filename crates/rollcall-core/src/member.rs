//! Member records
//!
//! `Member` is the internally-owned, source-independent representation.
//! `MemberSource` is one external system's view of the same person,
//! always freshly fetched and never persisted internally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MemberId;
use crate::status::MemberStatus;
use crate::values::{Email, ExternalId, IdSource, Source};

/// The canonical member record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Canonical id. Immutable once created.
    pub id: MemberId,

    /// Lifecycle status.
    pub status: MemberStatus,

    /// Full name.
    pub name: String,

    /// Primary email address.
    pub email: Email,

    /// Organisation the member belongs to, if known.
    pub organisation_name: Option<String>,

    /// Where this member is known to exist externally.
    /// At most one entry per source.
    pub source_ids: Vec<IdSource>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new member with no external linkage yet.
    pub fn new(name: impl Into<String>, email: Email) -> Self {
        let now = Utc::now();
        Self {
            id: MemberId::new(),
            status: MemberStatus::default(),
            name: name.into(),
            email,
            organisation_name: None,
            source_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a member from a freshly fetched source record.
    ///
    /// Used by the CREATE branch of reconciliation: the new member takes
    /// the source's externally-owned fields and records the source id.
    pub fn from_source(source_record: &MemberSource) -> Self {
        let now = Utc::now();
        Self {
            id: MemberId::new(),
            status: source_record.status,
            name: source_record.name.clone(),
            email: source_record.email.clone(),
            organisation_name: source_record.organisation_name.clone(),
            source_ids: vec![source_record.id_source()],
            created_at: now,
            updated_at: now,
        }
    }

    /// The id this member has at the given source, if one is recorded.
    pub fn source_id_for(&self, source: Source) -> Option<&IdSource> {
        self.source_ids.iter().find(|s| s.source == source)
    }

    /// Record (or replace) this member's id at one source.
    ///
    /// Keeps the at-most-one-id-per-source invariant. Returns false when
    /// the identical pair was already recorded.
    pub fn upsert_source_id(&mut self, id_source: IdSource) -> bool {
        match self.source_ids.iter_mut().find(|s| s.source == id_source.source) {
            Some(existing) if *existing == id_source => false,
            Some(existing) => {
                *existing = id_source;
                self.updated_at = Utc::now();
                true
            }
            None => {
                self.source_ids.push(id_source);
                self.updated_at = Utc::now();
                true
            }
        }
    }

    /// Merge a source record's externally-owned fields into this member.
    ///
    /// Only status, name, email and organisation are owned by sources;
    /// the canonical id and linkage to other sources are never touched.
    /// Returns the updated record, or `None` when nothing would change,
    /// which callers use to skip the persistence call entirely.
    pub fn apply_source(&self, source_record: &MemberSource) -> Option<Member> {
        let mut updated = self.clone();
        updated.status = source_record.status;
        updated.name = source_record.name.clone();
        updated.email = source_record.email.clone();
        updated.organisation_name = source_record.organisation_name.clone();

        let id_source = source_record.id_source();
        match updated.source_ids.iter_mut().find(|s| s.source == id_source.source) {
            Some(existing) => *existing = id_source,
            None => updated.source_ids.push(id_source),
        }

        if updated.status == self.status
            && updated.name == self.name
            && updated.email == self.email
            && updated.organisation_name == self.organisation_name
            && updated.source_ids == self.source_ids
        {
            return None;
        }
        updated.updated_at = Utc::now();
        Some(updated)
    }
}

/// One external system's view of a member, converted into canonical
/// field shapes by the source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSource {
    /// The id assigned by the external system.
    pub id: ExternalId,

    /// Which system this record was fetched from.
    pub source: Source,

    /// Lifecycle status.
    pub status: MemberStatus,

    /// Full name.
    pub name: String,

    /// Email address.
    pub email: Email,

    /// Organisation, where the system tracks one.
    pub organisation_name: Option<String>,
}

impl MemberSource {
    /// This record's identity as an id/source pair.
    pub fn id_source(&self) -> IdSource {
        IdSource::new(self.source, self.id.clone())
    }

    /// Merge the canonical member's fields into this source record.
    ///
    /// The mirror image of [`Member::apply_source`], used when the
    /// source system is the reconciliation target. Returns `None` when
    /// the source copy already agrees.
    pub fn apply_member(&self, member: &Member) -> Option<MemberSource> {
        let updated = MemberSource {
            id: self.id.clone(),
            source: self.source,
            status: member.status,
            name: member.name.clone(),
            email: member.email.clone(),
            organisation_name: member.organisation_name.clone(),
        };
        if updated == *self {
            return None;
        }
        Some(updated)
    }
}

/// The fields needed to create a member at an external system.
///
/// No id: the backend assigns one. Backend-specific create defaults
/// (passwords, roles, connection names) are injected by the adapter,
/// never carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSourceForCreate {
    /// Lifecycle status.
    pub status: MemberStatus,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: Email,
    /// Organisation, if known.
    pub organisation_name: Option<String>,
}

impl MemberSourceForCreate {
    /// Prepare a create payload from the canonical member.
    pub fn from_member(member: &Member) -> Self {
        Self {
            status: member.status,
            name: member.name.clone(),
            email: member.email.clone(),
            organisation_name: member.organisation_name.clone(),
        }
    }
}
