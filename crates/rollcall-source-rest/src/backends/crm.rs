//! CRM binding
//!
//! Members live on the CRM's Contact object with customised fields.
//! Lookups by id hit the object endpoint directly; lookups by email go
//! through the query endpoint, which answers with a records envelope.
//! Creates answer with a bare id and updates answer with no body, so
//! both decode paths are overridden.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rollcall_core::{Email, ExternalId, MemberSource, MemberSourceForCreate, Source};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::MemberSourceIdentifier;

use crate::binding::{Endpoint, MemberSourceBackend};

use super::{invalid, parse_member_status};

const CONTACT_PATH: &str = "sobjects/Contact";
const CONTACT_FIELDS: &str =
    "Id, Full_name_custom__c, Email, Organisation_name__c, Membership_status__c";

/// Binding for the CRM backend.
#[derive(Debug, Clone, Default)]
pub struct CrmBinding;

impl CrmBinding {
    /// Create the binding.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CrmContact {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Full_name_custom__c")]
    name: String,
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Organisation_name__c", default)]
    organisation_name: Option<String>,
    #[serde(rename = "Membership_status__c", default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrmQueryResponse {
    records: Vec<Value>,
}

impl MemberSourceBackend for CrmBinding {
    fn source(&self) -> Source {
        Source::Crm
    }

    fn find_endpoint(&self, identifier: &MemberSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            MemberSourceIdentifier::SourceId(id) => {
                Some(Endpoint::get(format!("{CONTACT_PATH}/{id}")))
            }
            MemberSourceIdentifier::Email(email) => Some(Endpoint::get("query").with_query(
                "q",
                format!(
                    "SELECT {CONTACT_FIELDS} FROM Contact WHERE Email = '{}'",
                    email.as_str().replace('\'', "\\'")
                ),
            )),
        }
    }

    fn create_endpoint(&self) -> Endpoint {
        Endpoint::post(CONTACT_PATH)
    }

    fn update_endpoint(&self, id: &ExternalId) -> Endpoint {
        Endpoint::patch(format!("{CONTACT_PATH}/{id}"))
    }

    fn decode(&self, body: &Value) -> SyncResult<MemberSource> {
        let contact: CrmContact =
            serde_json::from_value(body.clone()).map_err(|e| invalid(self.source(), e))?;
        Ok(MemberSource {
            id: ExternalId::parse(contact.id).map_err(|e| invalid(self.source(), e))?,
            source: self.source(),
            status: parse_member_status(self.source(), contact.status.as_deref())?,
            name: contact.name,
            email: Email::parse(contact.email).map_err(|e| invalid(self.source(), e))?,
            organisation_name: contact.organisation_name,
        })
    }

    fn decode_find(
        &self,
        identifier: &MemberSourceIdentifier,
        body: &Value,
    ) -> SyncResult<MemberSource> {
        match identifier {
            MemberSourceIdentifier::SourceId(_) => self.decode(body),
            MemberSourceIdentifier::Email(email) => {
                let response: CrmQueryResponse = serde_json::from_value(body.clone())
                    .map_err(|e| invalid(self.source(), e))?;
                let record = response
                    .records
                    .first()
                    .ok_or_else(|| SyncError::not_found("member-source", email.as_str()))?;
                self.decode(record)
            }
        }
    }

    fn decode_created(
        &self,
        member: &MemberSourceForCreate,
        body: &Value,
    ) -> SyncResult<MemberSource> {
        // create answers { "id": ..., "success": true }
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(self.source(), "create response carries no id"))?;
        Ok(MemberSource {
            id: ExternalId::parse(id).map_err(|e| invalid(self.source(), e))?,
            source: self.source(),
            status: member.status,
            name: member.name.clone(),
            email: member.email.clone(),
            organisation_name: member.organisation_name.clone(),
        })
    }

    fn decode_updated(&self, member: &MemberSource, body: &Value) -> SyncResult<MemberSource> {
        // update answers 204 with no body
        let _ = body;
        Ok(member.clone())
    }

    fn encode_create(&self, member: &MemberSourceForCreate) -> Value {
        json!({
            "Full_name_custom__c": member.name,
            "Email": member.email.as_str(),
            "Organisation_name__c": member.organisation_name,
            "Membership_status__c": member.status.as_str(),
        })
    }

    fn encode_update(&self, member: &MemberSource) -> Value {
        json!({
            "Full_name_custom__c": member.name,
            "Email": member.email.as_str(),
            "Organisation_name__c": member.organisation_name,
            "Membership_status__c": member.status.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::MemberStatus;

    #[test]
    fn test_decode_contact() {
        let binding = CrmBinding::new();
        let body = json!({
            "Id": "S1",
            "Full_name_custom__c": "Ada Lovelace",
            "Email": "ada@example.com",
            "Organisation_name__c": "Analytical Engines",
            "Membership_status__c": "active",
        });
        let record = binding.decode(&body).unwrap();
        assert_eq!(record.id.as_str(), "S1");
        assert_eq!(record.status, MemberStatus::Active);
        assert_eq!(record.source, Source::Crm);
    }

    #[test]
    fn test_decode_defaults_missing_status() {
        let binding = CrmBinding::new();
        let body = json!({
            "Id": "S1",
            "Full_name_custom__c": "Ada Lovelace",
            "Email": "ada@example.com",
        });
        let record = binding.decode(&body).unwrap();
        assert_eq!(record.status, MemberStatus::Pending);
    }

    #[test]
    fn test_decode_rejects_bad_shape() {
        let binding = CrmBinding::new();
        let err = binding.decode(&json!({ "Id": "S1" })).unwrap_err();
        assert_eq!(err.error_code(), "SOURCE_INVALID");
    }

    #[test]
    fn test_email_find_unwraps_query_envelope() {
        let binding = CrmBinding::new();
        let identifier =
            MemberSourceIdentifier::Email(Email::parse("ada@example.com").unwrap());
        let body = json!({
            "totalSize": 1,
            "records": [{
                "Id": "S1",
                "Full_name_custom__c": "Ada Lovelace",
                "Email": "ada@example.com",
            }],
        });
        let record = binding.decode_find(&identifier, &body).unwrap();
        assert_eq!(record.id.as_str(), "S1");

        let empty = json!({ "totalSize": 0, "records": [] });
        let err = binding.decode_find(&identifier, &empty).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_encode_roundtrips_through_decode() {
        let binding = CrmBinding::new();
        let record = MemberSource {
            id: ExternalId::parse("S1").unwrap(),
            source: Source::Crm,
            status: MemberStatus::Active,
            name: "Ada Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            organisation_name: None,
        };
        let mut encoded = binding.encode_update(&record);
        encoded["Id"] = json!("S1");
        assert_eq!(binding.decode(&encoded).unwrap(), record);
    }
}
