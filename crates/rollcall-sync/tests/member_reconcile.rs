//! Member reconciliation behavior, end to end against the fakes.

use std::sync::Arc;

use rollcall_core::{
    Email, ExternalId, Member, MemberSource, MemberStatus, OutcomeKind, RecordEvent, Source,
};
use rollcall_sync::config::SyncConfig;
use rollcall_sync::identifier::MemberIdentifier;
use rollcall_sync::member_sync::{CreateMemberRequest, MemberRef, MemberSync, UpsertMemberRequest};
use rollcall_sync::testing::{FakeMemberRepository, FakeMemberSourceRepository};

fn email(s: &str) -> Email {
    Email::parse(s).unwrap()
}

fn external_id(s: &str) -> ExternalId {
    ExternalId::parse(s).unwrap()
}

fn crm_record(id: &str, email_str: &str, status: MemberStatus) -> MemberSource {
    MemberSource {
        id: external_id(id),
        source: Source::Crm,
        status,
        name: "Ada Lovelace".to_string(),
        email: email(email_str),
        organisation_name: None,
    }
}

fn engine_with(
    store: Arc<FakeMemberRepository>,
    sources: Vec<Arc<FakeMemberSourceRepository>>,
) -> MemberSync {
    let mut engine = MemberSync::new(SyncConfig::default(), store).unwrap();
    for source in sources {
        engine = engine.with_source(source);
    }
    engine
}

fn pull_by_id(value: &str) -> UpsertMemberRequest {
    UpsertMemberRequest {
        source: Source::Crm,
        id_source_value: Some(value.to_string()),
        email: None,
    }
}

#[tokio::test]
async fn creates_member_when_store_has_none() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    crm.seed(crm_record("S1", "a@b.com", MemberStatus::Active));

    let engine = engine_with(store.clone(), vec![crm]);
    let outcome = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap();

    assert_eq!(outcome.event, RecordEvent::Created);
    assert_eq!(outcome.outcome, OutcomeKind::Success);
    assert_eq!(outcome.record.status, MemberStatus::Active);

    let stored = store
        .get(&MemberIdentifier::Email(email("a@b.com")))
        .expect("member persisted");
    assert_eq!(
        stored.source_id_for(Source::Crm).unwrap().id,
        external_id("S1")
    );
}

#[tokio::test]
async fn updates_member_when_source_moved_on() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let mut stale = crm_record("S1", "a@b.com", MemberStatus::Pending);
    let member = Member::from_source(&stale);
    store.seed(member);
    stale.status = MemberStatus::Active;
    crm.seed(stale);

    let engine = engine_with(store.clone(), vec![crm]);
    let outcome = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap();

    assert_eq!(outcome.event, RecordEvent::Updated);
    assert_eq!(outcome.outcome, OutcomeKind::Success);
    assert_eq!(outcome.record.status, MemberStatus::Active);
}

#[tokio::test]
async fn no_change_skips_the_write_and_repeats_are_idempotent() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    let record = crm_record("S1", "a@b.com", MemberStatus::Active);
    store.seed(Member::from_source(&record));
    crm.seed(record);

    let engine = engine_with(store.clone(), vec![crm]);

    let first = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap();
    assert_eq!(first.outcome, OutcomeKind::NoChange);
    assert_eq!(store.save_calls(), 0, "no-change must not write");

    let before = store
        .get(&MemberIdentifier::Email(email("a@b.com")))
        .unwrap();
    let second = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap();
    assert_eq!(second.outcome, OutcomeKind::NoChange);
    assert_eq!(store.save_calls(), 0);
    assert_eq!(
        store
            .get(&MemberIdentifier::Email(email("a@b.com")))
            .unwrap(),
        before,
        "record unchanged by the second run"
    );
}

#[tokio::test]
async fn rejected_store_update_becomes_failure_outcome() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let mut record = crm_record("S1", "a@b.com", MemberStatus::Pending);
    let member = Member::from_source(&record);
    store.seed(member.clone());
    record.status = MemberStatus::Active;
    crm.seed(record);
    store.set_reject_saves(true);

    let engine = engine_with(store.clone(), vec![crm]);
    let outcome = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap();

    assert_eq!(outcome.outcome, OutcomeKind::Failure);
    // the envelope carries the pre-existing copy, not the failed merge
    assert_eq!(outcome.record.status, MemberStatus::Pending);
    assert_eq!(outcome.record.id, member.id);
}

#[tokio::test]
async fn missing_required_source_record_escalates() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let engine = engine_with(store, vec![crm]);
    let err = engine
        .upsert_member(&pull_by_id("crm#missing"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn source_outage_is_not_treated_as_absence() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    crm.seed(crm_record("S1", "a@b.com", MemberStatus::Active));
    crm.set_unavailable(true);

    let engine = engine_with(store.clone(), vec![crm]);
    let err = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap_err();

    assert_eq!(err.error_code(), "SOURCE_UNAVAILABLE");
    assert_eq!(store.save_calls(), 0, "no create on an outage");
}

#[tokio::test]
async fn create_conflicts_when_email_belongs_to_another_member() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    // someone else already owns the email internally, with no CRM link
    store.seed(Member::new("Someone Else", email("a@b.com")));
    crm.seed(crm_record("S1", "a@b.com", MemberStatus::Active));

    let engine = engine_with(store.clone(), vec![crm]);
    let err = engine.upsert_member(&pull_by_id("crm#S1")).await.unwrap_err();

    assert_eq!(err.error_code(), "CONFLICT");
    assert_eq!(store.save_calls(), 0, "conflict must not create");
}

#[tokio::test]
async fn recorded_source_id_beats_email_when_locating_at_source() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    // the member's recorded id and their email point at different
    // records; the by-id result must win
    let by_id = crm_record("S1", "old@b.com", MemberStatus::Active);
    let by_email = crm_record("S9", "a@b.com", MemberStatus::Active);
    crm.seed_by_id_only(by_id);
    crm.seed_by_email_only(by_email);

    let mut member = Member::new("Ada Lovelace", email("a@b.com"));
    member.status = MemberStatus::Active;
    member.upsert_source_id(rollcall_core::IdSource::new(Source::Crm, external_id("S1")));
    store.seed(member.clone());

    let engine = engine_with(store, vec![crm.clone()]);
    let outcome = engine
        .upsert_member_source(Source::Crm, &MemberRef::Record(member))
        .await
        .unwrap();

    assert_eq!(outcome.record.id, external_id("S1"), "by-id lookup won");
    assert_eq!(crm.create_calls(), 0, "no duplicate account was created");
}

#[tokio::test]
async fn pushing_to_an_unlinked_source_creates_and_links_back() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let member = Member::new("Ada Lovelace", email("a@b.com"));
    store.seed(member.clone());

    let engine = engine_with(store.clone(), vec![crm.clone()]);
    let outcome = engine
        .upsert_member_source(Source::Crm, &MemberRef::Record(member.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.event, RecordEvent::Created);
    assert_eq!(crm.create_calls(), 1);

    // the new external id was recorded on the canonical member
    let linked = store.get(&MemberIdentifier::Id(member.id)).unwrap();
    assert_eq!(
        linked.source_id_for(Source::Crm).unwrap().id,
        outcome.record.id
    );
}

#[tokio::test]
async fn pushing_twice_is_a_no_op_the_second_time() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let member = Member::new("Ada Lovelace", email("a@b.com"));
    store.seed(member.clone());

    let engine = engine_with(store.clone(), vec![crm.clone()]);
    let member_ref = MemberRef::Identifier(MemberIdentifier::Id(member.id));

    let first = engine
        .upsert_member_source(Source::Crm, &member_ref)
        .await
        .unwrap();
    assert_eq!(first.event, RecordEvent::Created);

    let second = engine
        .upsert_member_source(Source::Crm, &member_ref)
        .await
        .unwrap();
    assert_eq!(second.outcome, OutcomeKind::NoChange);
    assert_eq!(crm.create_calls(), 1);
    assert_eq!(crm.update_calls(), 0, "no-change must not write");
}

#[tokio::test]
async fn rejected_source_update_becomes_failure_outcome() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));

    let record = crm_record("S1", "a@b.com", MemberStatus::Pending);
    crm.seed(record.clone());
    crm.set_reject_updates(true);

    let mut member = Member::from_source(&record);
    member.status = MemberStatus::Active;
    store.seed(member.clone());

    let engine = engine_with(store, vec![crm]);
    let outcome = engine
        .upsert_member_source(Source::Crm, &MemberRef::Record(member))
        .await
        .unwrap();

    assert_eq!(outcome.outcome, OutcomeKind::Failure);
    assert_eq!(outcome.record.status, MemberStatus::Pending);
}

#[tokio::test]
async fn unsupported_identifier_is_a_configuration_error() {
    let store = Arc::new(FakeMemberRepository::new());
    let course = Arc::new(FakeMemberSourceRepository::new(Source::CoursePlatform).without_email_lookup());

    // no course-platform id recorded, so the engine falls back to email,
    // which this backend cannot serve
    let member = Member::new("Ada Lovelace", email("a@b.com"));
    store.seed(member.clone());

    let engine = engine_with(store, vec![course]);
    let err = engine
        .upsert_member_source(Source::CoursePlatform, &MemberRef::Record(member))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "UNSUPPORTED_IDENTIFIER");
}

#[tokio::test]
async fn fan_out_collects_per_source_outcomes_without_aborting() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    let auth = Arc::new(FakeMemberSourceRepository::new(Source::Auth));
    auth.set_unavailable(true);

    let member = Member::new("Ada Lovelace", email("a@b.com"));
    store.seed(member.clone());

    let config = SyncConfig::default().with_member_sources(vec![Source::Crm, Source::Auth]);
    let engine = MemberSync::new(config, store.clone())
        .unwrap()
        .with_source(crm.clone())
        .with_source(auth);

    let report = engine
        .upsert_member_to_sources(&MemberRef::Identifier(MemberIdentifier::Id(member.id)))
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].source, Source::Crm);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].source, Source::Auth);
    assert_eq!(report.errors[0].code, "SOURCE_UNAVAILABLE");

    let summary = report.summary();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errored, 1);
    assert!(!report.is_converged());
}

#[tokio::test]
async fn create_member_ex_nihilo_then_conflict() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    let engine = engine_with(store.clone(), vec![crm]);

    let request = CreateMemberRequest {
        name: "Ada Lovelace".to_string(),
        email: "a@b.com".to_string(),
        organisation_name: Some("Analytical Engines".to_string()),
    };

    let outcome = engine.create_member(&request).await.unwrap();
    assert_eq!(outcome.event, RecordEvent::Created);
    assert!(outcome.record.source_ids.is_empty());

    let err = engine.create_member(&request).await.unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");
}

#[tokio::test]
async fn find_member_source_routes_by_source_key() {
    let store = Arc::new(FakeMemberRepository::new());
    let crm = Arc::new(FakeMemberSourceRepository::new(Source::Crm));
    crm.seed(crm_record("S1", "a@b.com", MemberStatus::Active));

    let engine = engine_with(store, vec![crm]);

    let found = engine
        .find_member_source(
            Source::Crm,
            &rollcall_sync::identifier::MemberSourceIdentifier::SourceId(external_id("S1")),
        )
        .await
        .unwrap();
    assert_eq!(found.email, email("a@b.com"));

    // no adapter registered for this source at all
    let err = engine
        .find_member_source(
            Source::Auth,
            &rollcall_sync::identifier::MemberSourceIdentifier::SourceId(external_id("S1")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INTERNAL_REQUEST_INVALID");
}
