//! Generic REST adapter
//!
//! Owns the HTTP client, endpoint construction, authentication, and the
//! mapping from transport outcomes onto the reconciliation error
//! taxonomy. Everything backend-specific comes from the binding.
//!
//! The status mapping is what keeps "not found" and "transport failure"
//! distinct for the orchestrator: a 404 after a successful round trip is
//! `NotFound`; connect errors, timeouts and server-side failures are
//! `SourceUnavailable` and never reach the create branch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use rollcall_core::{
    ExternalId, GroupSource, GroupSourceForCreate, MemberSource, MemberSourceForCreate, Source,
};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::{GroupSourceIdentifier, MemberSourceIdentifier};
use rollcall_sync::traits::{GroupSourceRepository, MemberSourceRepository};

use crate::binding::{Endpoint, GroupSourceBackend, HttpMethod, MemberSourceBackend};
use crate::config::{RestSourceConfig, SourceAuth};

/// Which operation a request serves; decides how client errors map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Find,
    Create,
    Update,
    Delete,
}

/// Shared transport for one backend.
struct RestTransport {
    source: Source,
    entity: &'static str,
    config: RestSourceConfig,
    base_url: Url,
    client: Client,
}

impl RestTransport {
    fn new(source: Source, entity: &'static str, config: RestSourceConfig) -> SyncResult<Self> {
        let base_url = config.validate(source)?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| SyncError::internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            source,
            entity,
            config,
            base_url,
            client,
        })
    }

    fn url_for(&self, endpoint: &Endpoint) -> SyncResult<Url> {
        let mut url = self.base_url.join(&endpoint.path).map_err(|e| {
            SyncError::internal(format!("invalid endpoint path {}: {e}", endpoint.path))
        })?;
        if !endpoint.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &endpoint.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Send one request and map the response onto the taxonomy.
    ///
    /// `subject` names the record for not-found/conflict messages.
    async fn send(
        &self,
        operation: Operation,
        endpoint: &Endpoint,
        body: Option<&Value>,
        subject: &str,
    ) -> SyncResult<Value> {
        let url = self.url_for(endpoint)?;
        debug!(
            source = %self.source,
            method = endpoint.method.as_str(),
            path = %endpoint.path,
            "sending request"
        );

        let mut request = match endpoint.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        request = match &self.config.auth {
            SourceAuth::None => request,
            SourceAuth::Bearer { token } => request.bearer_auth(token),
            SourceAuth::ApiKey { header_name, key } => request.header(header_name.as_str(), key),
        };

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            SyncError::unavailable(self.source, format!("request failed: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            let text = response.text().await.map_err(|e| {
                SyncError::unavailable(self.source, format!("failed to read body: {e}"))
            })?;
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| {
                SyncError::source_invalid(self.source, format!("response is not json: {e}"))
            });
        }

        warn!(
            source = %self.source,
            status = status.as_u16(),
            method = endpoint.method.as_str(),
            path = %endpoint.path,
            "backend answered with an error status"
        );

        Err(match status {
            StatusCode::NOT_FOUND => SyncError::not_found(self.entity, subject),
            StatusCode::CONFLICT => SyncError::conflict(self.entity, subject),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Unauthorized {
                source_system: self.source,
            },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
                if operation == Operation::Update =>
            {
                SyncError::update_rejected(self.entity, format!("{subject}: http {status}"))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                SyncError::unavailable(self.source, format!("http {status}"))
            }
            status if status.is_server_error() => {
                SyncError::unavailable(self.source, format!("http {status}"))
            }
            status => SyncError::source_invalid(self.source, format!("unexpected http {status}")),
        })
    }
}

/// A member repository over one REST backend.
pub struct RestMemberSourceRepository<B: MemberSourceBackend> {
    backend: B,
    transport: RestTransport,
}

impl<B: MemberSourceBackend> RestMemberSourceRepository<B> {
    /// Create an adapter from a binding and connection settings.
    pub fn new(backend: B, config: RestSourceConfig) -> SyncResult<Self> {
        let transport = RestTransport::new(backend.source(), "member-source", config)?;
        Ok(Self { backend, transport })
    }
}

#[async_trait]
impl<B: MemberSourceBackend> MemberSourceRepository for RestMemberSourceRepository<B> {
    fn source(&self) -> Source {
        self.backend.source()
    }

    #[instrument(skip(self, identifier), fields(source = %self.backend.source(), kind = identifier.kind()))]
    async fn find_one(&self, identifier: &MemberSourceIdentifier) -> SyncResult<MemberSource> {
        let endpoint = self.backend.find_endpoint(identifier).ok_or_else(|| {
            SyncError::unsupported_identifier(self.backend.source(), identifier.kind())
        })?;
        let body = self
            .transport
            .send(Operation::Find, &endpoint, None, &identifier.to_string())
            .await?;
        self.backend.decode_find(identifier, &body)
    }

    #[instrument(skip(self, member), fields(source = %self.backend.source()))]
    async fn create(&self, member: &MemberSourceForCreate) -> SyncResult<MemberSource> {
        let endpoint = self.backend.create_endpoint();
        let payload = self.backend.encode_create(member);
        let body = self
            .transport
            .send(Operation::Create, &endpoint, Some(&payload), member.email.as_str())
            .await?;
        self.backend.decode_created(member, &body)
    }

    #[instrument(skip(self, member), fields(source = %self.backend.source(), external_id = %member.id))]
    async fn update(&self, member: &MemberSource) -> SyncResult<MemberSource> {
        let endpoint = self.backend.update_endpoint(&member.id);
        let payload = self.backend.encode_update(member);
        let body = self
            .transport
            .send(Operation::Update, &endpoint, Some(&payload), member.id.as_str())
            .await?;
        self.backend.decode_updated(member, &body)
    }

    #[instrument(skip(self, id), fields(source = %self.backend.source(), external_id = %id))]
    async fn delete(&self, id: &ExternalId) -> SyncResult<()> {
        let endpoint = self
            .backend
            .delete_endpoint(id)
            .ok_or_else(|| SyncError::unsupported_operation(self.backend.source(), "delete"))?;
        self.transport
            .send(Operation::Delete, &endpoint, None, id.as_str())
            .await?;
        Ok(())
    }
}

/// A group repository over one REST backend.
pub struct RestGroupSourceRepository<B: GroupSourceBackend> {
    backend: B,
    transport: RestTransport,
}

impl<B: GroupSourceBackend> RestGroupSourceRepository<B> {
    /// Create an adapter from a binding and connection settings.
    pub fn new(backend: B, config: RestSourceConfig) -> SyncResult<Self> {
        let transport = RestTransport::new(backend.source(), "group-source", config)?;
        Ok(Self { backend, transport })
    }
}

#[async_trait]
impl<B: GroupSourceBackend> GroupSourceRepository for RestGroupSourceRepository<B> {
    fn source(&self) -> Source {
        self.backend.source()
    }

    #[instrument(skip(self, identifier), fields(source = %self.backend.source(), kind = identifier.kind()))]
    async fn find_one(&self, identifier: &GroupSourceIdentifier) -> SyncResult<GroupSource> {
        let endpoint = self.backend.find_endpoint(identifier).ok_or_else(|| {
            SyncError::unsupported_identifier(self.backend.source(), identifier.kind())
        })?;
        let body = self
            .transport
            .send(Operation::Find, &endpoint, None, &identifier.to_string())
            .await?;
        self.backend.decode_find(identifier, &body)
    }

    #[instrument(skip(self, group), fields(source = %self.backend.source()))]
    async fn create(&self, group: &GroupSourceForCreate) -> SyncResult<GroupSource> {
        let endpoint = self.backend.create_endpoint();
        let payload = self.backend.encode_create(group);
        let body = self
            .transport
            .send(Operation::Create, &endpoint, Some(&payload), group.slug.as_str())
            .await?;
        self.backend.decode_created(group, &body)
    }

    #[instrument(skip(self, group), fields(source = %self.backend.source(), external_id = %group.id))]
    async fn update(&self, group: &GroupSource) -> SyncResult<GroupSource> {
        let endpoint = self.backend.update_endpoint(&group.id);
        let payload = self.backend.encode_update(group);
        let body = self
            .transport
            .send(Operation::Update, &endpoint, Some(&payload), group.id.as_str())
            .await?;
        self.backend.decode_updated(group, &body)
    }

    #[instrument(skip(self, id), fields(source = %self.backend.source(), external_id = %id))]
    async fn delete(&self, id: &ExternalId) -> SyncResult<()> {
        let endpoint = self
            .backend
            .delete_endpoint(id)
            .ok_or_else(|| SyncError::unsupported_operation(self.backend.source(), "delete"))?;
        self.transport
            .send(Operation::Delete, &endpoint, None, id.as_str())
            .await?;
        Ok(())
    }
}
