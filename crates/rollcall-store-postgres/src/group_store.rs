//! Group store
//!
//! The group twin of the member store; slug takes the place of email as
//! the unique natural key.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use rollcall_core::{Group, GroupStatus};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::GroupIdentifier;
use rollcall_sync::traits::GroupRepository;

use crate::{map_sqlx_error, parse_source_ids, source_ids_predicate};

const GROUP_COLUMNS: &str = "id, status, name, slug, source_ids, created_at, updated_at";

/// The canonical group store over Postgres.
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    /// Create a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, identifier: &GroupIdentifier) -> SyncResult<Option<Group>> {
        let query = match identifier {
            GroupIdentifier::Id(_) => {
                format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1")
            }
            GroupIdentifier::SourceIdValue(_) => {
                format!("SELECT {GROUP_COLUMNS} FROM groups WHERE source_ids @> $1")
            }
            GroupIdentifier::Slug(_) => {
                format!("SELECT {GROUP_COLUMNS} FROM groups WHERE slug = $1")
            }
        };

        let query = sqlx::query(&query);
        let query = match identifier {
            GroupIdentifier::Id(id) => query.bind(id.as_uuid()),
            GroupIdentifier::SourceIdValue(id_source) => {
                query.bind(source_ids_predicate(id_source))
            }
            GroupIdentifier::Slug(slug) => query.bind(slug.as_str().to_string()),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("group", &identifier.to_string(), e))?;

        row.map(|r| row_to_group(&r)).transpose()
    }
}

fn row_to_group(row: &sqlx::postgres::PgRow) -> SyncResult<Group> {
    let status: String = row.get("status");
    let slug: String = row.get("slug");
    let source_ids: serde_json::Value = row.get("source_ids");
    Ok(Group {
        id: row.get::<sqlx::types::Uuid, _>("id").into(),
        status: status
            .parse::<GroupStatus>()
            .map_err(|e| SyncError::store(format!("corrupt group row: {e}")))?,
        name: row.get("name"),
        slug: slug
            .parse()
            .map_err(|e| SyncError::store(format!("corrupt group row: {e}")))?,
        source_ids: parse_source_ids(&source_ids)
            .map_err(|e| SyncError::store(format!("corrupt group row: {e}")))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    #[instrument(skip(self, identifier), fields(kind = identifier.kind()))]
    async fn find_one(&self, identifier: &GroupIdentifier) -> SyncResult<Group> {
        self.fetch_optional(identifier)
            .await?
            .ok_or_else(|| SyncError::not_found("group", identifier.to_string()))
    }

    #[instrument(skip(self, identifier), fields(kind = identifier.kind()))]
    async fn check(&self, identifier: &GroupIdentifier) -> SyncResult<bool> {
        Ok(self.fetch_optional(identifier).await?.is_some())
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn save(&self, group: &Group) -> SyncResult<Group> {
        let source_ids = serde_json::to_value(&group.source_ids)
            .map_err(|e| SyncError::store(format!("failed to encode source ids: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO groups (
                id, status, name, slug, source_ids, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                source_ids = EXCLUDED.source_ids,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(group.id.as_uuid())
        .bind(group.status.as_str())
        .bind(&group.name)
        .bind(group.slug.as_str())
        .bind(source_ids)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("group", group.slug.as_str(), e))?;

        Ok(group.clone())
    }
}
