//! Group records
//!
//! The group twin of [`crate::member`]: a canonical `Group` plus the
//! per-system `GroupSource` view. Groups are located externally by slug
//! where members use email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::GroupId;
use crate::status::GroupStatus;
use crate::values::{ExternalId, IdSource, Slug, Source};

/// The canonical group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Canonical id. Immutable once created.
    pub id: GroupId,

    /// Lifecycle status.
    pub status: GroupStatus,

    /// Display name.
    pub name: String,

    /// URL-safe identifier, unique internally and at each source.
    pub slug: Slug,

    /// Where this group is known to exist externally.
    /// At most one entry per source.
    pub source_ids: Vec<IdSource>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Create a new group with no external linkage yet.
    pub fn new(name: impl Into<String>, slug: Slug) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            status: GroupStatus::default(),
            name: name.into(),
            slug,
            source_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a group from a freshly fetched source record.
    pub fn from_source(source_record: &GroupSource) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            status: source_record.status,
            name: source_record.name.clone(),
            slug: source_record.slug.clone(),
            source_ids: vec![source_record.id_source()],
            created_at: now,
            updated_at: now,
        }
    }

    /// The id this group has at the given source, if one is recorded.
    pub fn source_id_for(&self, source: Source) -> Option<&IdSource> {
        self.source_ids.iter().find(|s| s.source == source)
    }

    /// Record (or replace) this group's id at one source.
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

    /// Merge a source record's externally-owned fields into this group.
    ///
    /// Returns `None` when nothing would change.
    pub fn apply_source(&self, source_record: &GroupSource) -> Option<Group> {
        let mut updated = self.clone();
        updated.status = source_record.status;
        updated.name = source_record.name.clone();
        updated.slug = source_record.slug.clone();

        let id_source = source_record.id_source();
        match updated.source_ids.iter_mut().find(|s| s.source == id_source.source) {
            Some(existing) => *existing = id_source,
            None => updated.source_ids.push(id_source),
        }

        if updated.status == self.status
            && updated.name == self.name
            && updated.slug == self.slug
            && updated.source_ids == self.source_ids
        {
            return None;
        }
        updated.updated_at = Utc::now();
        Some(updated)
    }
}

/// One external system's view of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSource {
    /// The id assigned by the external system.
    pub id: ExternalId,

    /// Which system this record was fetched from.
    pub source: Source,

    /// Lifecycle status.
    pub status: GroupStatus,

    /// Display name.
    pub name: String,

    /// URL-safe identifier.
    pub slug: Slug,
}

impl GroupSource {
    /// This record's identity as an id/source pair.
    pub fn id_source(&self) -> IdSource {
        IdSource::new(self.source, self.id.clone())
    }

    /// Merge the canonical group's fields into this source record.
    ///
    /// Returns `None` when the source copy already agrees.
    pub fn apply_group(&self, group: &Group) -> Option<GroupSource> {
        let updated = GroupSource {
            id: self.id.clone(),
            source: self.source,
            status: group.status,
            name: group.name.clone(),
            slug: group.slug.clone(),
        };
        if updated == *self {
            return None;
        }
        Some(updated)
    }
}

/// The fields needed to create a group at an external system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSourceForCreate {
    /// Lifecycle status.
    pub status: GroupStatus,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: Slug,
}

impl GroupSourceForCreate {
    /// Prepare a create payload from the canonical group.
    pub fn from_group(group: &Group) -> Self {
        Self {
            status: group.status,
            name: group.name.clone(),
            slug: group.slug.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Slug {
        Slug::parse(s).unwrap()
    }

    fn external_id(s: &str) -> ExternalId {
        ExternalId::parse(s).unwrap()
    }

    fn source_record() -> GroupSource {
        GroupSource {
            id: external_id("G1"),
            source: Source::Community,
            status: GroupStatus::Active,
            name: "Mechanical Computing".to_string(),
            slug: slug("mechanical-computing"),
        }
    }

    #[test]
    fn test_group_from_source_links_source_id() {
        let group = Group::from_source(&source_record());
        assert_eq!(group.status, GroupStatus::Active);
        assert_eq!(
            group.source_id_for(Source::Community).unwrap().id,
            external_id("G1")
        );
    }

    #[test]
    fn test_apply_source_no_change() {
        let group = Group::from_source(&source_record());
        assert!(group.apply_source(&source_record()).is_none());
    }

    #[test]
    fn test_apply_source_merges() {
        let group = Group::from_source(&source_record());
        let mut fresher = source_record();
        fresher.status = GroupStatus::Closed;

        let updated = group.apply_source(&fresher).unwrap();
        assert_eq!(updated.id, group.id);
        assert_eq!(updated.status, GroupStatus::Closed);
    }

    #[test]
    fn test_apply_group_no_change() {
        let group = Group::from_source(&source_record());
        assert!(source_record().apply_group(&group).is_none());
    }

    #[test]
    fn test_upsert_source_id() {
        let mut group = Group::from_source(&source_record());
        assert!(group.upsert_source_id(IdSource::new(
            Source::CoursePlatform,
            external_id("edapp-1")
        )));
        assert_eq!(group.source_ids.len(), 2);
        assert!(!group.upsert_source_id(IdSource::new(
            Source::CoursePlatform,
            external_id("edapp-1")
        )));
    }
}
