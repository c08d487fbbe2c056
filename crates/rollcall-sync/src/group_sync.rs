//! Group reconciliation
//!
//! The group twin of [`crate::member_sync`]. Same state machine, same
//! decision rule; groups are located externally by slug where members
//! use email.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use rollcall_core::{
    Group, GroupSource, GroupSourceForCreate, IdSource, Slug, Source, UpsertOutcome,
};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identifier::{GroupIdentifier, GroupSourceIdentifier};
use crate::multi::MultiSourceReport;
use crate::pipeline::ResultExt;
use crate::traits::{GroupRepository, GroupSourceRepository};

/// Request to reconcile a group from one source system into the
/// canonical store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertGroupRequest {
    /// The source system to reconcile from.
    pub source: Source,
    /// Packed `source#id` locator.
    pub id_source_value: Option<String>,
    /// Slug locator.
    pub slug: Option<String>,
}

/// Request to create a group ex nihilo, without consulting a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
}

/// A group handed to the push direction: either the record itself, or
/// enough to find it.
#[derive(Debug, Clone)]
pub enum GroupRef {
    /// The canonical record, already in hand.
    Record(Group),
    /// Locate the record in the canonical store first.
    Identifier(GroupIdentifier),
}

/// The group reconciliation engine.
pub struct GroupSync {
    config: SyncConfig,
    store: Arc<dyn GroupRepository>,
    sources: HashMap<Source, Arc<dyn GroupSourceRepository>>,
}

impl GroupSync {
    /// Create an engine over the canonical store.
    pub fn new(config: SyncConfig, store: Arc<dyn GroupRepository>) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            sources: HashMap::new(),
        })
    }

    /// Register a source adapter, keyed by its own source key.
    pub fn with_source(mut self, adapter: Arc<dyn GroupSourceRepository>) -> Self {
        self.sources.insert(adapter.source(), adapter);
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn source_repo(&self, source: Source) -> SyncResult<&Arc<dyn GroupSourceRepository>> {
        self.sources.get(&source).ok_or_else(|| {
            SyncError::internal(format!("no group source adapter registered for {source}"))
        })
    }

    fn group_identifiers(
        request: &UpsertGroupRequest,
    ) -> SyncResult<(GroupSourceIdentifier, GroupIdentifier)> {
        if let Some(value) = &request.id_source_value {
            let id_source = IdSource::parse_value(value)?;
            if id_source.source != request.source {
                return Err(SyncError::request_invalid(format!(
                    "id source value {value} does not belong to source {}",
                    request.source
                )));
            }
            return Ok((
                GroupSourceIdentifier::SourceId(id_source.id.clone()),
                GroupIdentifier::SourceIdValue(id_source),
            ));
        }
        if let Some(slug) = &request.slug {
            let slug = Slug::parse(slug.as_str())?;
            return Ok((
                GroupSourceIdentifier::Slug(slug.clone()),
                GroupIdentifier::Slug(slug),
            ));
        }
        Err(SyncError::request_invalid(
            "one of id_source_value or slug is required",
        ))
    }

    /// Reconcile a group from a source system into the canonical store.
    ///
    /// Same shape as [`MemberSync::upsert_member`]: concurrent lookups,
    /// then create / update / no-change; the source record is required.
    ///
    /// [`MemberSync::upsert_member`]: crate::member_sync::MemberSync::upsert_member
    #[instrument(skip(self, request), fields(source = %request.source))]
    pub async fn upsert_group(
        &self,
        request: &UpsertGroupRequest,
    ) -> SyncResult<UpsertOutcome<Group>> {
        let repo = self.source_repo(request.source)?;
        let (source_identifier, internal_identifier) = Self::group_identifiers(request)?;

        let (source_found, internal_found) = tokio::join!(
            repo.find_one(&source_identifier),
            self.store.find_one(&internal_identifier),
        );

        let source_record = source_found.action("find group at source")?;
        let existing = internal_found
            .map(Some)
            .action("find group internally")
            .recover_not_found_with(|| None)?;

        match existing {
            None => {
                self.create_group_from_source(&source_record, &internal_identifier)
                    .await
            }
            Some(group) => self.update_group_from_source(group, &source_record).await,
        }
    }

    async fn create_group_from_source(
        &self,
        source_record: &GroupSource,
        located_by: &GroupIdentifier,
    ) -> SyncResult<UpsertOutcome<Group>> {
        let group = Group::from_source(source_record);

        // Found nothing by source id; the slug may still be taken.
        if !matches!(located_by, GroupIdentifier::Slug(_)) {
            let slug_taken = self
                .store
                .check(&GroupIdentifier::Slug(group.slug.clone()))
                .await
                .action("check group slug")?;
            if slug_taken {
                return Err(SyncError::conflict("group", group.slug.as_str()));
            }
        }

        let saved = self
            .store
            .save(&group)
            .await
            .action("create group from source")?;
        info!(group_id = %saved.id, source = %source_record.source, "group created");
        Ok(UpsertOutcome::created(saved))
    }

    async fn update_group_from_source(
        &self,
        existing: Group,
        source_record: &GroupSource,
    ) -> SyncResult<UpsertOutcome<Group>> {
        match existing.apply_source(source_record) {
            None => {
                debug!(group_id = %existing.id, "group already agrees with source");
                Ok(UpsertOutcome::no_change(existing))
            }
            Some(updated) => self
                .store
                .save(&updated)
                .await
                .map(UpsertOutcome::updated)
                .action("save group from source")
                .recover_update_rejected_with(|| UpsertOutcome::update_failed(existing)),
        }
    }

    /// Create a group from an inbound payload, without consulting any
    /// source. Fails with a conflict when the slug is already taken.
    #[instrument(skip(self, request))]
    pub async fn create_group(
        &self,
        request: &CreateGroupRequest,
    ) -> SyncResult<UpsertOutcome<Group>> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SyncError::request_invalid("name is required"));
        }
        let slug = Slug::parse(request.slug.as_str())?;

        let exists = self
            .store
            .check(&GroupIdentifier::Slug(slug.clone()))
            .await
            .action("check group slug")?;
        if exists {
            return Err(SyncError::conflict("group", slug.as_str()));
        }

        let group = Group::new(name, slug);
        let saved = self.store.save(&group).await.action("create group")?;
        info!(group_id = %saved.id, "group created");
        Ok(UpsertOutcome::created(saved))
    }

    /// Reconcile the canonical group out to one source system.
    #[instrument(skip(self, group_ref))]
    pub async fn upsert_group_source(
        &self,
        source: Source,
        group_ref: &GroupRef,
    ) -> SyncResult<UpsertOutcome<GroupSource>> {
        let repo = self.source_repo(source)?;
        let mut group = self.resolve_group(group_ref).await?;

        // By-id beats by-slug, for the same duplicate-account reason as
        // members.
        let source_identifier = match group.source_id_for(source) {
            Some(id_source) => GroupSourceIdentifier::SourceId(id_source.id.clone()),
            None => GroupSourceIdentifier::Slug(group.slug.clone()),
        };

        let existing = repo
            .find_one(&source_identifier)
            .await
            .map(Some)
            .action("find group at source")
            .recover_not_found_with(|| None)?;

        let outcome = match existing {
            None => {
                let created = repo
                    .create(&GroupSourceForCreate::from_group(&group))
                    .await
                    .action("create group at source")?;
                info!(source = %source, external_id = %created.id, "group created at source");
                UpsertOutcome::created(created)
            }
            Some(source_record) => match source_record.apply_group(&group) {
                None => {
                    debug!(source = %source, "group source already agrees");
                    UpsertOutcome::no_change(source_record)
                }
                Some(updated) => repo
                    .update(&updated)
                    .await
                    .map(UpsertOutcome::updated)
                    .action("update group at source")
                    .recover_update_rejected_with(|| UpsertOutcome::update_failed(source_record))?,
            },
        };

        if group.upsert_source_id(outcome.record.id_source()) {
            self.store
                .save(&group)
                .await
                .action("record source id on group")?;
        }

        Ok(outcome)
    }

    /// Reconcile the canonical group out to every configured source.
    #[instrument(skip(self, group_ref))]
    pub async fn upsert_group_to_sources(
        &self,
        group_ref: &GroupRef,
    ) -> SyncResult<MultiSourceReport<GroupSource>> {
        let group_id = self.resolve_group(group_ref).await?.id;
        let mut report = MultiSourceReport::new();

        for source in self.config.group_sources.clone() {
            let result = self
                .upsert_group_source(source, &GroupRef::Identifier(GroupIdentifier::Id(group_id)))
                .await;
            match result {
                Ok(outcome) => report.record(source, outcome),
                Err(err) => report.record_error(source, &err),
            }
        }
        Ok(report)
    }

    /// Find a group in the canonical store.
    pub async fn find_group(&self, identifier: &GroupIdentifier) -> SyncResult<Group> {
        self.store.find_one(identifier).await
    }

    /// Find a group at one source system.
    pub async fn find_group_source(
        &self,
        source: Source,
        identifier: &GroupSourceIdentifier,
    ) -> SyncResult<GroupSource> {
        self.source_repo(source)?.find_one(identifier).await
    }

    async fn resolve_group(&self, group_ref: &GroupRef) -> SyncResult<Group> {
        match group_ref {
            GroupRef::Record(group) => Ok(group.clone()),
            GroupRef::Identifier(identifier) => {
                self.store.find_one(identifier).await.action("find group")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_prefer_id_source_value() {
        let request = UpsertGroupRequest {
            source: Source::Community,
            id_source_value: Some("community#G1".to_string()),
            slug: Some("mechanical-computing".to_string()),
        };
        let (source_identifier, internal_identifier) =
            GroupSync::group_identifiers(&request).unwrap();
        assert_eq!(source_identifier.kind(), "source-id");
        assert_eq!(internal_identifier.kind(), "id-source-value");
    }

    #[test]
    fn test_identifiers_fall_back_to_slug() {
        let request = UpsertGroupRequest {
            source: Source::Community,
            id_source_value: None,
            slug: Some("mechanical-computing".to_string()),
        };
        let (source_identifier, _) = GroupSync::group_identifiers(&request).unwrap();
        assert_eq!(source_identifier.kind(), "slug");
    }

    #[test]
    fn test_identifiers_reject_mismatched_source() {
        let request = UpsertGroupRequest {
            source: Source::CoursePlatform,
            id_source_value: Some("community#G1".to_string()),
            slug: None,
        };
        assert!(GroupSync::group_identifiers(&request).is_err());
    }
}
