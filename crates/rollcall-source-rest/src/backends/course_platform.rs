//! Course platform binding
//!
//! Members are platform users, found by id or by username (which the
//! platform equates with email); user search answers with an items
//! envelope. New users get the default role set and a generated
//! password injected. Groups map onto the platform's user-groups, which
//! can only be fetched by id -- the API cannot filter on the custom
//! field where the slug lives, so slug lookups are unsupported rather
//! than not-found.

use rand::distributions::Alphanumeric;
use rand::Rng;
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

const DEFAULT_ROLES: [&str; 2] = ["app-user", "prizing-user"];

/// Binding for the course platform backend.
#[derive(Debug, Clone, Default)]
pub struct CoursePlatformBinding;

impl CoursePlatformBinding {
    const SOURCE: Source = Source::CoursePlatform;

    /// Create the binding.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CourseUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    email: String,
    #[serde(rename = "customFields", default)]
    custom_fields: Option<CourseUserFields>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CourseUserFields {
    #[serde(rename = "organisationName", default)]
    organisation_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CourseItems {
    items: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CourseGroup {
    id: String,
    name: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "customFields", default)]
    custom_fields: Option<CourseGroupFields>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CourseGroupFields {
    #[serde(default)]
    slug: Option<String>,
}

fn generate_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    format!("{body}!3bY")
}

impl MemberSourceBackend for CoursePlatformBinding {
    fn source(&self) -> Source {
        Source::CoursePlatform
    }

    fn find_endpoint(&self, identifier: &MemberSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            MemberSourceIdentifier::SourceId(id) => Some(Endpoint::get(format!("users/{id}"))),
            MemberSourceIdentifier::Email(email) => {
                Some(Endpoint::get("users").with_query("username", email.as_str()))
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
        let user: CourseUser =
            serde_json::from_value(body.clone()).map_err(|e| invalid(Self::SOURCE, e))?;
        let fields = user.custom_fields.unwrap_or_default();
        let email = Email::parse(user.email).map_err(|e| invalid(Self::SOURCE, e))?;
        Ok(MemberSource {
            id: ExternalId::parse(user.id).map_err(|e| invalid(Self::SOURCE, e))?,
            source: Self::SOURCE,
            status: parse_member_status(Self::SOURCE, fields.status.as_deref())?,
            // older accounts predate the name field and carry only the
            // email-derived username
            name: user.name.unwrap_or_else(|| email.as_str().to_string()),
            email,
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
            MemberSourceIdentifier::Email(email) => {
                let response: CourseItems = serde_json::from_value(body.clone())
                    .map_err(|e| invalid(Self::SOURCE, e))?;
                let item = response
                    .items
                    .first()
                    .ok_or_else(|| SyncError::not_found("member-source", email.as_str()))?;
                MemberSourceBackend::decode(self, item)
            }
        }
    }

    fn encode_create(&self, member: &MemberSourceForCreate) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "customFields": {
                "organisationName": member.organisation_name,
                "status": member.status.as_str(),
            },
            "roles": DEFAULT_ROLES,
            "password": generate_password(),
        })
    }

    fn encode_update(&self, member: &MemberSource) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "customFields": {
                "organisationName": member.organisation_name,
                "status": member.status.as_str(),
            },
        })
    }
}

impl GroupSourceBackend for CoursePlatformBinding {
    fn source(&self) -> Source {
        Source::CoursePlatform
    }

    fn find_endpoint(&self, identifier: &GroupSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            GroupSourceIdentifier::SourceId(id) => {
                Some(Endpoint::get(format!("user-groups/{id}")))
            }
            // user-groups cannot be filtered on custom fields
            GroupSourceIdentifier::Slug(_) => None,
        }
    }

    fn create_endpoint(&self) -> Endpoint {
        Endpoint::post("user-groups")
    }

    fn update_endpoint(&self, id: &ExternalId) -> Endpoint {
        Endpoint::put(format!("user-groups/{id}"))
    }

    fn decode(&self, body: &Value) -> SyncResult<GroupSource> {
        let group: CourseGroup =
            serde_json::from_value(body.clone()).map_err(|e| invalid(Self::SOURCE, e))?;
        let fields = group.custom_fields.unwrap_or_default();
        let slug = fields
            .slug
            .ok_or_else(|| invalid(Self::SOURCE, "group carries no slug custom field"))?;
        Ok(GroupSource {
            id: ExternalId::parse(group.id).map_err(|e| invalid(Self::SOURCE, e))?,
            source: Self::SOURCE,
            status: parse_group_status(Self::SOURCE, group.status.as_deref())?,
            name: group.name,
            slug: Slug::parse(slug).map_err(|e| invalid(Self::SOURCE, e))?,
        })
    }

    fn encode_create(&self, group: &GroupSourceForCreate) -> Value {
        json!({
            "name": group.name,
            "status": group.status.as_str(),
            "customFields": { "slug": group.slug.as_str() },
        })
    }

    fn encode_update(&self, group: &GroupSource) -> Value {
        json!({
            "name": group.name,
            "status": group.status.as_str(),
            "customFields": { "slug": group.slug.as_str() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{GroupStatus, MemberStatus};

    #[test]
    fn test_decode_user_with_username_only() {
        let binding = CoursePlatformBinding::new();
        let body = json!({
            "id": "edapp-9",
            "email": "ada@example.com",
        });
        let record = MemberSourceBackend::decode(&binding, &body).unwrap();
        assert_eq!(record.name, "ada@example.com");
        assert_eq!(record.status, MemberStatus::Pending);
    }

    #[test]
    fn test_email_find_unwraps_items_envelope() {
        let binding = CoursePlatformBinding::new();
        let identifier =
            MemberSourceIdentifier::Email(Email::parse("ada@example.com").unwrap());

        let body = json!({ "items": [{ "id": "edapp-9", "email": "ada@example.com" }] });
        let record = MemberSourceBackend::decode_find(&binding, &identifier, &body).unwrap();
        assert_eq!(record.id.as_str(), "edapp-9");

        let err = MemberSourceBackend::decode_find(&binding, &identifier, &json!({ "items": [] }))
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_create_injects_roles_and_password() {
        let binding = CoursePlatformBinding::new();
        let member = MemberSourceForCreate {
            status: MemberStatus::Pending,
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            organisation_name: None,
        };
        let payload = MemberSourceBackend::encode_create(&binding, &member);
        assert_eq!(payload["roles"], json!(["app-user", "prizing-user"]));
        assert!(payload["password"].as_str().unwrap().len() > 16);
    }

    #[test]
    fn test_group_slug_lookup_is_unsupported() {
        let binding = CoursePlatformBinding::new();
        let identifier = GroupSourceIdentifier::Slug(Slug::parse("mechanical-computing").unwrap());
        assert!(GroupSourceBackend::find_endpoint(&binding, &identifier).is_none());
    }

    #[test]
    fn test_decode_group_requires_slug() {
        let binding = CoursePlatformBinding::new();
        let body = json!({
            "id": "ug-4",
            "name": "Mechanical Computing",
            "status": "active",
            "customFields": { "slug": "mechanical-computing" },
        });
        let record = GroupSourceBackend::decode(&binding, &body).unwrap();
        assert_eq!(record.status, GroupStatus::Active);
        assert_eq!(record.slug.as_str(), "mechanical-computing");

        let bare = json!({ "id": "ug-4", "name": "Mechanical Computing" });
        let err = GroupSourceBackend::decode(&binding, &bare).unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_INVALID");
    }
}
