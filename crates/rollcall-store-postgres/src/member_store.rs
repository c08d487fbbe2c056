//! Member store
//!
//! Canonical member records in Postgres. The record body is columns;
//! the external linkage is a JSONB array queried with containment, so
//! a source-id lookup is one indexed predicate.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use rollcall_core::{Member, MemberStatus};
use rollcall_sync::error::{SyncError, SyncResult};
use rollcall_sync::identifier::MemberIdentifier;
use rollcall_sync::traits::MemberRepository;

use crate::{map_sqlx_error, parse_source_ids, source_ids_predicate};

const MEMBER_COLUMNS: &str =
    "id, status, name, email, organisation_name, source_ids, created_at, updated_at";

/// The canonical member store over Postgres.
pub struct PgMemberRepository {
    pool: PgPool,
}

impl PgMemberRepository {
    /// Create a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, identifier: &MemberIdentifier) -> SyncResult<Option<Member>> {
        let query = match identifier {
            MemberIdentifier::Id(_) => format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE id = $1"
            ),
            MemberIdentifier::SourceIdValue(_) => format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE source_ids @> $1"
            ),
            MemberIdentifier::Email(_) => format!(
                "SELECT {MEMBER_COLUMNS} FROM members WHERE email = $1"
            ),
        };

        let query = sqlx::query(&query);
        let query = match identifier {
            MemberIdentifier::Id(id) => query.bind(id.as_uuid()),
            MemberIdentifier::SourceIdValue(id_source) => {
                query.bind(source_ids_predicate(id_source))
            }
            MemberIdentifier::Email(email) => query.bind(email.as_str().to_string()),
        };

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("member", &identifier.to_string(), e))?;

        row.map(|r| row_to_member(&r)).transpose()
    }
}

fn row_to_member(row: &sqlx::postgres::PgRow) -> SyncResult<Member> {
    let status: String = row.get("status");
    let email: String = row.get("email");
    let source_ids: serde_json::Value = row.get("source_ids");
    Ok(Member {
        id: row.get::<sqlx::types::Uuid, _>("id").into(),
        status: status
            .parse::<MemberStatus>()
            .map_err(|e| SyncError::store(format!("corrupt member row: {e}")))?,
        name: row.get("name"),
        email: email
            .parse()
            .map_err(|e| SyncError::store(format!("corrupt member row: {e}")))?,
        organisation_name: row.get("organisation_name"),
        source_ids: parse_source_ids(&source_ids)
            .map_err(|e| SyncError::store(format!("corrupt member row: {e}")))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    #[instrument(skip(self, identifier), fields(kind = identifier.kind()))]
    async fn find_one(&self, identifier: &MemberIdentifier) -> SyncResult<Member> {
        self.fetch_optional(identifier)
            .await?
            .ok_or_else(|| SyncError::not_found("member", identifier.to_string()))
    }

    #[instrument(skip(self, identifier), fields(kind = identifier.kind()))]
    async fn check(&self, identifier: &MemberIdentifier) -> SyncResult<bool> {
        Ok(self.fetch_optional(identifier).await?.is_some())
    }

    #[instrument(skip(self, member), fields(member_id = %member.id))]
    async fn save(&self, member: &Member) -> SyncResult<Member> {
        let source_ids = serde_json::to_value(&member.source_ids)
            .map_err(|e| SyncError::store(format!("failed to encode source ids: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO members (
                id, status, name, email, organisation_name, source_ids,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                organisation_name = EXCLUDED.organisation_name,
                source_ids = EXCLUDED.source_ids,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(member.id.as_uuid())
        .bind(member.status.as_str())
        .bind(&member.name)
        .bind(member.email.as_str())
        .bind(&member.organisation_name)
        .bind(source_ids)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("member", member.email.as_str(), e))?;

        Ok(member.clone())
    }
}
