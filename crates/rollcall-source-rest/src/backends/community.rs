//! Community platform binding
//!
//! Serves both members and groups: one binding value, two adapter
//! instantiations. Search endpoints filter by query parameter and
//! answer with a bare array. New members get the default community role
//! injected at create. Groups are the one backend that allows delete,
//! used when a course group is torn down.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rollcall_core::{
    Email, ExternalId, GroupSource, GroupSourceForCreate, MemberSource, MemberSourceForCreate,
    Slug, Source,
};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::{GroupSourceIdentifier, MemberSourceIdentifier};

use crate::binding::{Endpoint, GroupSourceBackend, MemberSourceBackend};

use super::{invalid, parse_group_status, parse_member_status};

const DEFAULT_ROLE: &str = "member";

/// Binding for the community platform backend.
#[derive(Debug, Clone, Default)]
pub struct CommunityBinding;

impl CommunityBinding {
    const SOURCE: Source = Source::Community;

    /// Create the binding.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommunityUser {
    id: String,
    name: String,
    email: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    custom_fields: Option<CommunityUserFields>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CommunityUserFields {
    #[serde(default)]
    organisation_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CommunityGroup {
    id: String,
    name: String,
    slug: String,
    #[serde(default)]
    status: Option<String>,
}

fn first_of_array<'a>(
    source: Source,
    body: &'a Value,
    subject: &str,
    entity: &'static str,
) -> SyncResult<&'a Value> {
    let items = body
        .as_array()
        .ok_or_else(|| invalid(source, "expected an array"))?;
    items
        .first()
        .ok_or_else(|| SyncError::not_found(entity, subject))
}

impl MemberSourceBackend for CommunityBinding {
    fn source(&self) -> Source {
        Source::Community
    }

    fn find_endpoint(&self, identifier: &MemberSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            MemberSourceIdentifier::SourceId(id) => Some(Endpoint::get(format!("users/{id}"))),
            MemberSourceIdentifier::Email(email) => {
                Some(Endpoint::get("users").with_query("email", email.as_str()))
            }
        }
    }

    fn create_endpoint(&self) -> Endpoint {
        Endpoint::post("users")
    }

    fn update_endpoint(&self, id: &ExternalId) -> Endpoint {
        Endpoint::put(format!("users/{id}"))
    }

    fn decode(&self, body: &Value) -> SyncResult<MemberSource> {
        let user: CommunityUser =
            serde_json::from_value(body.clone()).map_err(|e| invalid(Self::SOURCE, e))?;
        let fields = user.custom_fields.unwrap_or_default();
        Ok(MemberSource {
            id: ExternalId::parse(user.id).map_err(|e| invalid(Self::SOURCE, e))?,
            source: Self::SOURCE,
            status: parse_member_status(Self::SOURCE, user.status.as_deref())?,
            name: user.name,
            email: Email::parse(user.email).map_err(|e| invalid(Self::SOURCE, e))?,
            organisation_name: fields.organisation_name,
        })
    }

    fn decode_find(
        &self,
        identifier: &MemberSourceIdentifier,
        body: &Value,
    ) -> SyncResult<MemberSource> {
        match identifier {
            MemberSourceIdentifier::SourceId(_) => MemberSourceBackend::decode(self, body),
            MemberSourceIdentifier::Email(email) => MemberSourceBackend::decode(
                self,
                first_of_array(Self::SOURCE, body, email.as_str(), "member-source")?,
            ),
        }
    }

    fn encode_create(&self, member: &MemberSourceForCreate) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "status": member.status.as_str(),
            "custom_fields": { "organisation_name": member.organisation_name },
            "role": DEFAULT_ROLE,
        })
    }

    fn encode_update(&self, member: &MemberSource) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "status": member.status.as_str(),
            "custom_fields": { "organisation_name": member.organisation_name },
        })
    }
}

impl GroupSourceBackend for CommunityBinding {
    fn source(&self) -> Source {
        Source::Community
    }

    fn find_endpoint(&self, identifier: &GroupSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            GroupSourceIdentifier::SourceId(id) => Some(Endpoint::get(format!("groups/{id}"))),
            GroupSourceIdentifier::Slug(slug) => {
                Some(Endpoint::get("groups").with_query("slug", slug.as_str()))
            }
        }
    }

    fn create_endpoint(&self) -> Endpoint {
        Endpoint::post("groups")
    }

    fn update_endpoint(&self, id: &ExternalId) -> Endpoint {
        Endpoint::put(format!("groups/{id}"))
    }

    fn delete_endpoint(&self, id: &ExternalId) -> Option<Endpoint> {
        Some(Endpoint::delete(format!("groups/{id}")))
    }

    fn decode(&self, body: &Value) -> SyncResult<GroupSource> {
        let group: CommunityGroup =
            serde_json::from_value(body.clone()).map_err(|e| invalid(Self::SOURCE, e))?;
        Ok(GroupSource {
            id: ExternalId::parse(group.id).map_err(|e| invalid(Self::SOURCE, e))?,
            source: Self::SOURCE,
            status: parse_group_status(Self::SOURCE, group.status.as_deref())?,
            name: group.name,
            slug: Slug::parse(group.slug).map_err(|e| invalid(Self::SOURCE, e))?,
        })
    }

    fn decode_find(
        &self,
        identifier: &GroupSourceIdentifier,
        body: &Value,
    ) -> SyncResult<GroupSource> {
        match identifier {
            GroupSourceIdentifier::SourceId(_) => GroupSourceBackend::decode(self, body),
            GroupSourceIdentifier::Slug(slug) => GroupSourceBackend::decode(
                self,
                first_of_array(Self::SOURCE, body, slug.as_str(), "group-source")?,
            ),
        }
    }

    fn encode_create(&self, group: &GroupSourceForCreate) -> Value {
        json!({
            "name": group.name,
            "slug": group.slug.as_str(),
            "status": group.status.as_str(),
        })
    }

    fn encode_update(&self, group: &GroupSource) -> Value {
        json!({
            "name": group.name,
            "slug": group.slug.as_str(),
            "status": group.status.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{GroupStatus, MemberStatus};

    #[test]
    fn test_decode_user() {
        let binding = CommunityBinding::new();
        let body = json!({
            "id": "u-77",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "status": "active",
            "custom_fields": { "organisation_name": "Analytical Engines" },
        });
        let record = MemberSourceBackend::decode(&binding, &body).unwrap();
        assert_eq!(record.id.as_str(), "u-77");
        assert_eq!(record.status, MemberStatus::Active);
    }

    #[test]
    fn test_create_injects_default_role() {
        let binding = CommunityBinding::new();
        let member = MemberSourceForCreate {
            status: MemberStatus::Pending,
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            organisation_name: None,
        };
        let payload = MemberSourceBackend::encode_create(&binding, &member);
        assert_eq!(payload["role"], "member");

        let record = MemberSource {
            id: ExternalId::parse("u-77").unwrap(),
            source: Source::Community,
            status: MemberStatus::Pending,
            name: member.name.clone(),
            email: member.email.clone(),
            organisation_name: None,
        };
        let update = MemberSourceBackend::encode_update(&binding, &record);
        assert!(update.get("role").is_none());
    }

    #[test]
    fn test_decode_group() {
        let binding = CommunityBinding::new();
        let body = json!({
            "id": "g-12",
            "name": "Mechanical Computing",
            "slug": "mechanical-computing",
            "status": "active",
        });
        let record = GroupSourceBackend::decode(&binding, &body).unwrap();
        assert_eq!(record.slug.as_str(), "mechanical-computing");
        assert_eq!(record.status, GroupStatus::Active);
    }

    #[test]
    fn test_group_slug_find_unwraps_array() {
        let binding = CommunityBinding::new();
        let identifier =
            GroupSourceIdentifier::Slug(Slug::parse("mechanical-computing").unwrap());

        let err = GroupSourceBackend::decode_find(&binding, &identifier, &json!([])).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_groups_allow_delete() {
        let binding = CommunityBinding::new();
        let id = ExternalId::parse("g-12").unwrap();
        assert!(GroupSourceBackend::delete_endpoint(&binding, &id).is_some());
        assert!(MemberSourceBackend::delete_endpoint(&binding, &id).is_none());
    }
}
