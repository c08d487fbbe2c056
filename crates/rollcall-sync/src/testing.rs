//! Fake repositories
//!
//! In-memory adapters used by the engine test suites and by local
//! wiring. They count calls so tests can assert that no write happened
//! on the no-change path, and they can be told to disagree between
//! lookup kinds or to reject writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use rollcall_core::{
    ExternalId, Group, GroupSource, GroupSourceForCreate, Member, MemberSource,
    MemberSourceForCreate, Source,
};

use crate::error::{SyncError, SyncResult};
use crate::identifier::{
    GroupIdentifier, GroupSourceIdentifier, MemberIdentifier, MemberSourceIdentifier,
};
use crate::traits::{
    GroupRepository, GroupSourceRepository, MemberRepository, MemberSourceRepository,
};

/// An in-memory member source system.
pub struct FakeMemberSourceRepository {
    source: Source,
    by_id: Mutex<HashMap<String, MemberSource>>,
    by_email: Mutex<HashMap<String, MemberSource>>,
    supports_email: bool,
    reject_updates: AtomicBool,
    unavailable: AtomicBool,
    next_id: AtomicUsize,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl FakeMemberSourceRepository {
    /// Create an empty fake for the given source.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            by_id: Mutex::new(HashMap::new()),
            by_email: Mutex::new(HashMap::new()),
            supports_email: true,
            reject_updates: AtomicBool::new(false),
            unavailable: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Disable email lookups, so they fail as unsupported.
    pub fn without_email_lookup(mut self) -> Self {
        self.supports_email = false;
        self
    }

    /// Seed a record, findable by id and by email.
    pub fn seed(&self, record: MemberSource) {
        self.by_email
            .lock()
            .unwrap()
            .insert(record.email.as_str().to_string(), record.clone());
        self.by_id
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record);
    }

    /// Seed a record findable only by id. Together with
    /// [`seed_by_email_only`](Self::seed_by_email_only) this lets a test
    /// make the two lookup kinds disagree.
    pub fn seed_by_id_only(&self, record: MemberSource) {
        self.by_id
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record);
    }

    /// Seed a record findable only by email.
    pub fn seed_by_email_only(&self, record: MemberSource) {
        self.by_email
            .lock()
            .unwrap()
            .insert(record.email.as_str().to_string(), record);
    }

    /// Make update calls fail with `UpdateRejected`.
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Make every call fail with `SourceUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of find calls made.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of create calls made.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of update calls made.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> SyncResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::unavailable(self.source, "fake offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl MemberSourceRepository for FakeMemberSourceRepository {
    fn source(&self) -> Source {
        self.source
    }

    async fn find_one(&self, identifier: &MemberSourceIdentifier) -> SyncResult<MemberSource> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        match identifier {
            MemberSourceIdentifier::SourceId(id) => self
                .by_id
                .lock()
                .unwrap()
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| SyncError::not_found("member-source", id.as_str())),
            MemberSourceIdentifier::Email(email) => {
                if !self.supports_email {
                    return Err(SyncError::unsupported_identifier(self.source, "email"));
                }
                self.by_email
                    .lock()
                    .unwrap()
                    .get(email.as_str())
                    .cloned()
                    .ok_or_else(|| SyncError::not_found("member-source", email.as_str()))
            }
        }
    }

    async fn create(&self, member: &MemberSourceForCreate) -> SyncResult<MemberSource> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = MemberSource {
            id: ExternalId::parse(format!("{}-fake-{n}", self.source))
                .expect("generated id is valid"),
            source: self.source,
            status: member.status,
            name: member.name.clone(),
            email: member.email.clone(),
            organisation_name: member.organisation_name.clone(),
        };
        self.seed(record.clone());
        Ok(record)
    }

    async fn update(&self, member: &MemberSource) -> SyncResult<MemberSource> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(SyncError::update_rejected("member-source", "fake rejection"));
        }
        if !self.by_id.lock().unwrap().contains_key(member.id.as_str()) {
            return Err(SyncError::not_found("member-source", member.id.as_str()));
        }
        self.seed(member.clone());
        Ok(member.clone())
    }

    async fn delete(&self, id: &ExternalId) -> SyncResult<()> {
        self.check_available()?;
        let removed = self.by_id.lock().unwrap().remove(id.as_str());
        match removed {
            Some(record) => {
                self.by_email.lock().unwrap().remove(record.email.as_str());
                Ok(())
            }
            None => Err(SyncError::not_found("member-source", id.as_str())),
        }
    }
}

/// An in-memory canonical member store.
pub struct FakeMemberRepository {
    records: Mutex<Vec<Member>>,
    reject_saves: AtomicBool,
    find_calls: AtomicUsize,
    check_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl FakeMemberRepository {
    /// Create an empty fake store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reject_saves: AtomicBool::new(false),
            find_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// Seed a member without counting a save call.
    pub fn seed(&self, member: Member) {
        self.records.lock().unwrap().push(member);
    }

    /// Make save calls fail with `UpdateRejected`.
    pub fn set_reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }

    /// Number of save calls made.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Number of find calls made.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of check calls made.
    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    /// A copy of the stored record matching the identifier, if any.
    pub fn get(&self, identifier: &MemberIdentifier) -> Option<Member> {
        find_member(&self.records.lock().unwrap(), identifier)
    }
}

impl Default for FakeMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn find_member(records: &[Member], identifier: &MemberIdentifier) -> Option<Member> {
    records
        .iter()
        .find(|member| match identifier {
            MemberIdentifier::Id(id) => member.id == *id,
            MemberIdentifier::SourceIdValue(id_source) => {
                member.source_ids.contains(id_source)
            }
            MemberIdentifier::Email(email) => member.email == *email,
        })
        .cloned()
}

#[async_trait]
impl MemberRepository for FakeMemberRepository {
    async fn find_one(&self, identifier: &MemberIdentifier) -> SyncResult<Member> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        find_member(&self.records.lock().unwrap(), identifier)
            .ok_or_else(|| SyncError::not_found("member", identifier.to_string()))
    }

    async fn check(&self, identifier: &MemberIdentifier) -> SyncResult<bool> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        Ok(find_member(&self.records.lock().unwrap(), identifier).is_some())
    }

    async fn save(&self, member: &Member) -> SyncResult<Member> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(SyncError::update_rejected("member", "fake rejection"));
        }
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|m| m.id == member.id) {
            Some(existing) => *existing = member.clone(),
            None => records.push(member.clone()),
        }
        Ok(member.clone())
    }
}

/// An in-memory group source system.
pub struct FakeGroupSourceRepository {
    source: Source,
    by_id: Mutex<HashMap<String, GroupSource>>,
    by_slug: Mutex<HashMap<String, GroupSource>>,
    supports_slug: bool,
    reject_updates: AtomicBool,
    next_id: AtomicUsize,
    find_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl FakeGroupSourceRepository {
    /// Create an empty fake for the given source.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            by_id: Mutex::new(HashMap::new()),
            by_slug: Mutex::new(HashMap::new()),
            supports_slug: true,
            reject_updates: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
            find_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Disable slug lookups, so they fail as unsupported.
    pub fn without_slug_lookup(mut self) -> Self {
        self.supports_slug = false;
        self
    }

    /// Seed a record, findable by id and by slug.
    pub fn seed(&self, record: GroupSource) {
        self.by_slug
            .lock()
            .unwrap()
            .insert(record.slug.as_str().to_string(), record.clone());
        self.by_id
            .lock()
            .unwrap()
            .insert(record.id.as_str().to_string(), record);
    }

    /// Make update calls fail with `UpdateRejected`.
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Number of find calls made.
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of create calls made.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of update calls made.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupSourceRepository for FakeGroupSourceRepository {
    fn source(&self) -> Source {
        self.source
    }

    async fn find_one(&self, identifier: &GroupSourceIdentifier) -> SyncResult<GroupSource> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        match identifier {
            GroupSourceIdentifier::SourceId(id) => self
                .by_id
                .lock()
                .unwrap()
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| SyncError::not_found("group-source", id.as_str())),
            GroupSourceIdentifier::Slug(slug) => {
                if !self.supports_slug {
                    return Err(SyncError::unsupported_identifier(self.source, "slug"));
                }
                self.by_slug
                    .lock()
                    .unwrap()
                    .get(slug.as_str())
                    .cloned()
                    .ok_or_else(|| SyncError::not_found("group-source", slug.as_str()))
            }
        }
    }

    async fn create(&self, group: &GroupSourceForCreate) -> SyncResult<GroupSource> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = GroupSource {
            id: ExternalId::parse(format!("{}-fake-{n}", self.source))
                .expect("generated id is valid"),
            source: self.source,
            status: group.status,
            name: group.name.clone(),
            slug: group.slug.clone(),
        };
        self.seed(record.clone());
        Ok(record)
    }

    async fn update(&self, group: &GroupSource) -> SyncResult<GroupSource> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(SyncError::update_rejected("group-source", "fake rejection"));
        }
        if !self.by_id.lock().unwrap().contains_key(group.id.as_str()) {
            return Err(SyncError::not_found("group-source", group.id.as_str()));
        }
        self.seed(group.clone());
        Ok(group.clone())
    }
}

/// An in-memory canonical group store.
pub struct FakeGroupRepository {
    records: Mutex<Vec<Group>>,
    reject_saves: AtomicBool,
    save_calls: AtomicUsize,
}

impl FakeGroupRepository {
    /// Create an empty fake store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reject_saves: AtomicBool::new(false),
            save_calls: AtomicUsize::new(0),
        }
    }

    /// Seed a group without counting a save call.
    pub fn seed(&self, group: Group) {
        self.records.lock().unwrap().push(group);
    }

    /// Make save calls fail with `UpdateRejected`.
    pub fn set_reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }

    /// Number of save calls made.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// A copy of the stored record matching the identifier, if any.
    pub fn get(&self, identifier: &GroupIdentifier) -> Option<Group> {
        find_group(&self.records.lock().unwrap(), identifier)
    }
}

impl Default for FakeGroupRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn find_group(records: &[Group], identifier: &GroupIdentifier) -> Option<Group> {
    records
        .iter()
        .find(|group| match identifier {
            GroupIdentifier::Id(id) => group.id == *id,
            GroupIdentifier::SourceIdValue(id_source) => group.source_ids.contains(id_source),
            GroupIdentifier::Slug(slug) => group.slug == *slug,
        })
        .cloned()
}

#[async_trait]
impl GroupRepository for FakeGroupRepository {
    async fn find_one(&self, identifier: &GroupIdentifier) -> SyncResult<Group> {
        find_group(&self.records.lock().unwrap(), identifier)
            .ok_or_else(|| SyncError::not_found("group", identifier.to_string()))
    }

    async fn check(&self, identifier: &GroupIdentifier) -> SyncResult<bool> {
        Ok(find_group(&self.records.lock().unwrap(), identifier).is_some())
    }

    async fn save(&self, group: &Group) -> SyncResult<Group> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(SyncError::update_rejected("group", "fake rejection"));
        }
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group.clone(),
            None => records.push(group.clone()),
        }
        Ok(group.clone())
    }
}
