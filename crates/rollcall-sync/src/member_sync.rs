//! Member reconciliation
//!
//! The upsert state machine for members, in both directions: pulling a
//! source system's record into the canonical store, and pushing the
//! canonical record out to a source system. The direction is selected
//! by which side is the target; the decision rule is the same.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use rollcall_core::{
    Email, IdSource, Member, MemberSource, MemberSourceForCreate, Source, UpsertOutcome,
};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identifier::{MemberIdentifier, MemberSourceIdentifier};
use crate::multi::MultiSourceReport;
use crate::pipeline::ResultExt;
use crate::traits::{MemberRepository, MemberSourceRepository};

/// Request to reconcile a member from one source system into the
/// canonical store.
///
/// At least one locator is required. When both are present the packed
/// id-source value wins; email is the fallback for records the source
/// has not been linked to yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertMemberRequest {
    /// The source system to reconcile from.
    pub source: Source,
    /// Packed `source#id` locator.
    pub id_source_value: Option<String>,
    /// Email locator.
    pub email: Option<String>,
}

/// Request to create a member ex nihilo, without consulting a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Organisation, if known.
    pub organisation_name: Option<String>,
}

/// A member handed to the push direction: either the record itself, or
/// enough to find it.
#[derive(Debug, Clone)]
pub enum MemberRef {
    /// The canonical record, already in hand.
    Record(Member),
    /// Locate the record in the canonical store first.
    Identifier(MemberIdentifier),
}

/// The member reconciliation engine.
///
/// Holds the canonical store, one adapter per configured source, and the
/// engine configuration. Stateless across calls; adapters hold no
/// record-level state either, so concurrent invocations are independent.
pub struct MemberSync {
    config: SyncConfig,
    store: Arc<dyn MemberRepository>,
    sources: HashMap<Source, Arc<dyn MemberSourceRepository>>,
}

impl MemberSync {
    /// Create an engine over the canonical store.
    pub fn new(config: SyncConfig, store: Arc<dyn MemberRepository>) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            sources: HashMap::new(),
        })
    }

    /// Register a source adapter, keyed by its own source key.
    pub fn with_source(mut self, adapter: Arc<dyn MemberSourceRepository>) -> Self {
        self.sources.insert(adapter.source(), adapter);
        self
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn source_repo(&self, source: Source) -> SyncResult<&Arc<dyn MemberSourceRepository>> {
        self.sources.get(&source).ok_or_else(|| {
            SyncError::internal(format!("no member source adapter registered for {source}"))
        })
    }

    /// Derive the pair of identifiers for the pull direction: one to
    /// search the source system, one to search the canonical store.
    fn member_identifiers(
        request: &UpsertMemberRequest,
    ) -> SyncResult<(MemberSourceIdentifier, MemberIdentifier)> {
        if let Some(value) = &request.id_source_value {
            let id_source = IdSource::parse_value(value)?;
            if id_source.source != request.source {
                return Err(SyncError::request_invalid(format!(
                    "id source value {value} does not belong to source {}",
                    request.source
                )));
            }
            return Ok((
                MemberSourceIdentifier::SourceId(id_source.id.clone()),
                MemberIdentifier::SourceIdValue(id_source),
            ));
        }
        if let Some(email) = &request.email {
            let email = Email::parse(email.as_str())?;
            return Ok((
                MemberSourceIdentifier::Email(email.clone()),
                MemberIdentifier::Email(email),
            ));
        }
        Err(SyncError::request_invalid(
            "one of id_source_value or email is required",
        ))
    }

    /// Reconcile a member from a source system into the canonical store.
    ///
    /// Locates the record at the source and internally (concurrently,
    /// they are independent reads), then: creates the member when the
    /// store has none, updates it when both exist and differ, or reports
    /// no-change without writing. The source record is required at this
    /// entry point, so its absence escalates.
    #[instrument(skip(self, request), fields(source = %request.source))]
    pub async fn upsert_member(
        &self,
        request: &UpsertMemberRequest,
    ) -> SyncResult<UpsertOutcome<Member>> {
        let repo = self.source_repo(request.source)?;
        let (source_identifier, internal_identifier) = Self::member_identifiers(request)?;

        let (source_found, internal_found) = tokio::join!(
            repo.find_one(&source_identifier),
            self.store.find_one(&internal_identifier),
        );

        let source_record = source_found.action("find member at source")?;
        let existing = internal_found
            .map(Some)
            .action("find member internally")
            .recover_not_found_with(|| None)?;

        match existing {
            None => {
                self.create_member_from_source(&source_record, &internal_identifier)
                    .await
            }
            Some(member) => self.update_member_from_source(member, &source_record).await,
        }
    }

    async fn create_member_from_source(
        &self,
        source_record: &MemberSource,
        located_by: &MemberIdentifier,
    ) -> SyncResult<UpsertOutcome<Member>> {
        let member = Member::from_source(source_record);

        // Located internally by source id and found nothing; the email
        // may still be taken by another member, and creating would then
        // collide rather than converge.
        if !matches!(located_by, MemberIdentifier::Email(_)) {
            let email_taken = self
                .store
                .check(&MemberIdentifier::Email(member.email.clone()))
                .await
                .action("check member email")?;
            if email_taken {
                return Err(SyncError::conflict("member", member.email.as_str()));
            }
        }

        let saved = self
            .store
            .save(&member)
            .await
            .action("create member from source")?;
        info!(member_id = %saved.id, source = %source_record.source, "member created");
        Ok(UpsertOutcome::created(saved))
    }

    async fn update_member_from_source(
        &self,
        existing: Member,
        source_record: &MemberSource,
    ) -> SyncResult<UpsertOutcome<Member>> {
        match existing.apply_source(source_record) {
            None => {
                debug!(member_id = %existing.id, "member already agrees with source");
                Ok(UpsertOutcome::no_change(existing))
            }
            Some(updated) => self
                .store
                .save(&updated)
                .await
                .map(UpsertOutcome::updated)
                .action("save member from source")
                .recover_update_rejected_with(|| UpsertOutcome::update_failed(existing)),
        }
    }

    /// Create a member from an inbound payload, without consulting any
    /// source. Fails with a conflict when the email is already taken.
    #[instrument(skip(self, request))]
    pub async fn create_member(
        &self,
        request: &CreateMemberRequest,
    ) -> SyncResult<UpsertOutcome<Member>> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SyncError::request_invalid("name is required"));
        }
        let email = Email::parse(request.email.as_str())?;

        let exists = self
            .store
            .check(&MemberIdentifier::Email(email.clone()))
            .await
            .action("check member email")?;
        if exists {
            return Err(SyncError::conflict("member", email.as_str()));
        }

        let mut member = Member::new(name, email);
        member.organisation_name = request.organisation_name.clone();
        let saved = self.store.save(&member).await.action("create member")?;
        info!(member_id = %saved.id, "member created");
        Ok(UpsertOutcome::created(saved))
    }

    /// Reconcile the canonical member out to one source system.
    ///
    /// The member must exist; locating it by an identifier that finds
    /// nothing escalates. The source record is optional: absent means
    /// create (with the adapter injecting backend defaults), present
    /// means update-or-no-change. A newly learned source id is recorded
    /// back onto the member so the next run locates by id.
    #[instrument(skip(self, member_ref))]
    pub async fn upsert_member_source(
        &self,
        source: Source,
        member_ref: &MemberRef,
    ) -> SyncResult<UpsertOutcome<MemberSource>> {
        let repo = self.source_repo(source)?;
        let mut member = self.resolve_member(member_ref).await?;

        // By-id always beats by-email: email is only trusted to locate
        // a record this source has never been linked to, otherwise an
        // email change would mint a duplicate external account.
        let source_identifier = match member.source_id_for(source) {
            Some(id_source) => MemberSourceIdentifier::SourceId(id_source.id.clone()),
            None => MemberSourceIdentifier::Email(member.email.clone()),
        };

        let existing = repo
            .find_one(&source_identifier)
            .await
            .map(Some)
            .action("find member at source")
            .recover_not_found_with(|| None)?;

        let outcome = match existing {
            None => {
                let created = repo
                    .create(&MemberSourceForCreate::from_member(&member))
                    .await
                    .action("create member at source")?;
                info!(source = %source, external_id = %created.id, "member created at source");
                UpsertOutcome::created(created)
            }
            Some(source_record) => match source_record.apply_member(&member) {
                None => {
                    debug!(source = %source, "member source already agrees");
                    UpsertOutcome::no_change(source_record)
                }
                Some(updated) => repo
                    .update(&updated)
                    .await
                    .map(UpsertOutcome::updated)
                    .action("update member at source")
                    .recover_update_rejected_with(|| UpsertOutcome::update_failed(source_record))?,
            },
        };

        if member.upsert_source_id(outcome.record.id_source()) {
            self.store
                .save(&member)
                .await
                .action("record source id on member")?;
        }

        Ok(outcome)
    }

    /// Reconcile the canonical member out to every configured source,
    /// collecting per-source envelopes. One source failing does not
    /// abort the rest.
    #[instrument(skip(self, member_ref))]
    pub async fn upsert_member_to_sources(
        &self,
        member_ref: &MemberRef,
    ) -> SyncResult<MultiSourceReport<MemberSource>> {
        // Resolve once for the id, then re-read per source so each pass
        // sees the linkages recorded by the previous ones.
        let member_id = self.resolve_member(member_ref).await?.id;
        let mut report = MultiSourceReport::new();

        for source in self.config.member_sources.clone() {
            let result = self
                .upsert_member_source(
                    source,
                    &MemberRef::Identifier(MemberIdentifier::Id(member_id)),
                )
                .await;
            match result {
                Ok(outcome) => report.record(source, outcome),
                Err(err) => report.record_error(source, &err),
            }
        }
        Ok(report)
    }

    /// Find a member in the canonical store.
    pub async fn find_member(&self, identifier: &MemberIdentifier) -> SyncResult<Member> {
        self.store.find_one(identifier).await
    }

    /// Find a member at one source system.
    pub async fn find_member_source(
        &self,
        source: Source,
        identifier: &MemberSourceIdentifier,
    ) -> SyncResult<MemberSource> {
        self.source_repo(source)?.find_one(identifier).await
    }

    async fn resolve_member(&self, member_ref: &MemberRef) -> SyncResult<Member> {
        match member_ref {
            MemberRef::Record(member) => Ok(member.clone()),
            MemberRef::Identifier(identifier) => {
                self.store.find_one(identifier).await.action("find member")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_prefer_id_source_value() {
        let request = UpsertMemberRequest {
            source: Source::Crm,
            id_source_value: Some("crm#S1".to_string()),
            email: Some("ada@example.com".to_string()),
        };
        let (source_identifier, internal_identifier) =
            MemberSync::member_identifiers(&request).unwrap();
        assert_eq!(source_identifier.kind(), "source-id");
        assert_eq!(internal_identifier.kind(), "id-source-value");
    }

    #[test]
    fn test_identifiers_fall_back_to_email() {
        let request = UpsertMemberRequest {
            source: Source::Crm,
            id_source_value: None,
            email: Some("ada@example.com".to_string()),
        };
        let (source_identifier, internal_identifier) =
            MemberSync::member_identifiers(&request).unwrap();
        assert_eq!(source_identifier.kind(), "email");
        assert_eq!(internal_identifier.kind(), "email");
    }

    #[test]
    fn test_identifiers_require_a_locator() {
        let request = UpsertMemberRequest {
            source: Source::Crm,
            id_source_value: None,
            email: None,
        };
        let err = MemberSync::member_identifiers(&request).unwrap_err();
        assert_eq!(err.error_code(), "REQUEST_INVALID");
    }

    #[test]
    fn test_identifiers_reject_mismatched_source() {
        let request = UpsertMemberRequest {
            source: Source::Auth,
            id_source_value: Some("crm#S1".to_string()),
            email: None,
        };
        let err = MemberSync::member_identifiers(&request).unwrap_err();
        assert_eq!(err.error_code(), "REQUEST_INVALID");
    }
}
