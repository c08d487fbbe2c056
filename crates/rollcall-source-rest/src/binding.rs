//! Backend bindings
//!
//! One generic adapter owns the transport; a binding contributes only
//! what actually differs per backend: endpoint shapes per identifier
//! kind, native payload decode/encode, and create-time defaults. An
//! identifier kind a backend cannot serve is expressed by returning no
//! endpoint for it, which the adapter reports as a configuration error.

use serde_json::Value;

use rollcall_core::{
    ExternalId, GroupSource, GroupSourceForCreate, MemberSource, MemberSourceForCreate, Source,
};
use rollcall_sync::error::SyncResult;
use rollcall_sync::identifier::{GroupSourceIdentifier, MemberSourceIdentifier};

/// HTTP method for a backend endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A backend endpoint: method, path relative to the base URL, and query
/// parameters.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    /// A GET endpoint.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// A POST endpoint.
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// A PUT endpoint.
    pub fn put(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Put,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// A PATCH endpoint.
    pub fn patch(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Patch,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// A DELETE endpoint.
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Delete,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }
}

/// What one member backend contributes to the generic adapter.
pub trait MemberSourceBackend: Send + Sync {
    /// The constant source key.
    fn source(&self) -> Source;

    /// Endpoint for a lookup; `None` when this backend cannot serve the
    /// identifier kind.
    fn find_endpoint(&self, identifier: &MemberSourceIdentifier) -> Option<Endpoint>;

    /// Endpoint for creating a member.
    fn create_endpoint(&self) -> Endpoint;

    /// Endpoint for updating a member.
    fn update_endpoint(&self, id: &ExternalId) -> Endpoint;

    /// Endpoint for deleting a member; `None` when unsupported.
    fn delete_endpoint(&self, id: &ExternalId) -> Option<Endpoint> {
        let _ = id;
        None
    }

    /// Decode one native payload into the canonical shape.
    /// Failures are schema-contract violations, `SourceInvalid`.
    fn decode(&self, body: &Value) -> SyncResult<MemberSource>;

    /// Decode a lookup response. Backends whose search endpoints answer
    /// with list envelopes override this to unwrap one record or report
    /// `NotFound`.
    fn decode_find(
        &self,
        identifier: &MemberSourceIdentifier,
        body: &Value,
    ) -> SyncResult<MemberSource> {
        let _ = identifier;
        self.decode(body)
    }

    /// Decode a create response. Backends that answer a create with a
    /// bare id rather than the full record override this.
    fn decode_created(&self, member: &MemberSourceForCreate, body: &Value) -> SyncResult<MemberSource> {
        let _ = member;
        self.decode(body)
    }

    /// Decode an update response. Backends that answer an update with an
    /// empty body override this.
    fn decode_updated(&self, member: &MemberSource, body: &Value) -> SyncResult<MemberSource> {
        let _ = member;
        self.decode(body)
    }

    /// Encode a create payload. Backend-specific defaults (passwords,
    /// roles, connection names) are injected here.
    fn encode_create(&self, member: &MemberSourceForCreate) -> Value;

    /// Encode an update payload.
    fn encode_update(&self, member: &MemberSource) -> Value;
}

/// What one group backend contributes to the generic adapter.
pub trait GroupSourceBackend: Send + Sync {
    /// The constant source key.
    fn source(&self) -> Source;

    /// Endpoint for a lookup; `None` when this backend cannot serve the
    /// identifier kind.
    fn find_endpoint(&self, identifier: &GroupSourceIdentifier) -> Option<Endpoint>;

    /// Endpoint for creating a group.
    fn create_endpoint(&self) -> Endpoint;

    /// Endpoint for updating a group.
    fn update_endpoint(&self, id: &ExternalId) -> Endpoint;

    /// Endpoint for deleting a group; `None` when unsupported.
    fn delete_endpoint(&self, id: &ExternalId) -> Option<Endpoint> {
        let _ = id;
        None
    }

    /// Decode one native payload into the canonical shape.
    fn decode(&self, body: &Value) -> SyncResult<GroupSource>;

    /// Decode a lookup response.
    fn decode_find(
        &self,
        identifier: &GroupSourceIdentifier,
        body: &Value,
    ) -> SyncResult<GroupSource> {
        let _ = identifier;
        self.decode(body)
    }

    /// Decode a create response.
    fn decode_created(&self, group: &GroupSourceForCreate, body: &Value) -> SyncResult<GroupSource> {
        let _ = group;
        self.decode(body)
    }

    /// Decode an update response.
    fn decode_updated(&self, group: &GroupSource, body: &Value) -> SyncResult<GroupSource> {
        let _ = group;
        self.decode(body)
    }

    /// Encode a create payload.
    fn encode_create(&self, group: &GroupSourceForCreate) -> Value;

    /// Encode an update payload.
    fn encode_update(&self, group: &GroupSource) -> Value;
}
