//! Identity provider binding
//!
//! Members are accounts at the identity provider. Email lookups use the
//! dedicated users-by-email endpoint, which answers with an array.
//! Creating an account requires a connection name and a password; the
//! password is generated here, once, and never stored -- members set
//! their own through the reset flow.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rollcall_core::{Email, ExternalId, MemberSource, MemberSourceForCreate, Source};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::MemberSourceIdentifier;

use crate::binding::{Endpoint, MemberSourceBackend};

use super::{invalid, parse_member_status};

const DEFAULT_CONNECTION: &str = "Username-Password-Authentication";

/// Binding for the identity provider backend.
#[derive(Debug, Clone)]
pub struct AuthBinding {
    connection: String,
}

impl AuthBinding {
    /// Create the binding with the default connection name.
    pub fn new() -> Self {
        Self {
            connection: DEFAULT_CONNECTION.to_string(),
        }
    }

    /// Use a specific connection for created accounts.
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = connection.into();
        self
    }
}

impl Default for AuthBinding {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthUser {
    user_id: String,
    name: String,
    email: String,
    #[serde(default)]
    user_metadata: Option<AuthUserMetadata>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthUserMetadata {
    #[serde(default)]
    organisation_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// One-time password for account creation. The provider's policy wants
/// all four character classes.
fn generate_one_time_password() -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("{body}!9aZ")
}

impl MemberSourceBackend for AuthBinding {
    fn source(&self) -> Source {
        Source::Auth
    }

    fn find_endpoint(&self, identifier: &MemberSourceIdentifier) -> Option<Endpoint> {
        match identifier {
            MemberSourceIdentifier::SourceId(id) => Some(Endpoint::get(format!("users/{id}"))),
            MemberSourceIdentifier::Email(email) => {
                Some(Endpoint::get("users-by-email").with_query("email", email.as_str()))
            }
        }
    }

    fn create_endpoint(&self) -> Endpoint {
        Endpoint::post("users")
    }

    fn update_endpoint(&self, id: &ExternalId) -> Endpoint {
        Endpoint::patch(format!("users/{id}"))
    }

    fn decode(&self, body: &Value) -> SyncResult<MemberSource> {
        let user: AuthUser =
            serde_json::from_value(body.clone()).map_err(|e| invalid(self.source(), e))?;
        let metadata = user.user_metadata.unwrap_or_default();
        Ok(MemberSource {
            id: ExternalId::parse(user.user_id).map_err(|e| invalid(self.source(), e))?,
            source: self.source(),
            status: parse_member_status(self.source(), metadata.status.as_deref())?,
            name: user.name,
            email: Email::parse(user.email).map_err(|e| invalid(self.source(), e))?,
            organisation_name: metadata.organisation_name,
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
                // users-by-email answers with an array, empty on no match
                let users = body
                    .as_array()
                    .ok_or_else(|| invalid(self.source(), "expected an array of users"))?;
                let user = users
                    .first()
                    .ok_or_else(|| SyncError::not_found("member-source", email.as_str()))?;
                self.decode(user)
            }
        }
    }

    fn encode_create(&self, member: &MemberSourceForCreate) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "user_metadata": {
                "organisation_name": member.organisation_name,
                "status": member.status.as_str(),
            },
            "connection": self.connection,
            "password": generate_one_time_password(),
        })
    }

    fn encode_update(&self, member: &MemberSource) -> Value {
        json!({
            "name": member.name,
            "email": member.email.as_str(),
            "user_metadata": {
                "organisation_name": member.organisation_name,
                "status": member.status.as_str(),
            },
        })
    }
}
