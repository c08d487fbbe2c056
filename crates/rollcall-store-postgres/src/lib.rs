//! # rollcall Postgres store
//!
//! The internal adapter: the same find/check/save contract the engine
//! speaks to source systems, implemented against the canonical store.
//! Records are rows with a JSONB `source_ids` array; source-id lookups
//! use a containment predicate over a GIN index (see `schema.sql`).
//!
//! Error mapping keeps the taxonomy honest on the store side too: an
//! absent row is `NotFound`, a unique violation on insert is `Conflict`,
//! and connectivity failures surface as store errors, never as absence.

use rollcall_core::IdSource;
use rollcall_sync::error::SyncError;

pub mod group_store;
pub mod member_store;

pub use group_store::PgGroupRepository;
pub use member_store::PgMemberRepository;

/// JSONB containment predicate for one id/source pair.
pub(crate) fn source_ids_predicate(id_source: &IdSource) -> serde_json::Value {
    serde_json::json!([{
        "source": id_source.source.as_str(),
        "id": id_source.id.as_str(),
    }])
}

/// Decode a stored `source_ids` JSONB array.
pub(crate) fn parse_source_ids(value: &serde_json::Value) -> Result<Vec<IdSource>, String> {
    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

/// Map a sqlx failure onto the reconciliation taxonomy.
pub(crate) fn map_sqlx_error(entity: &'static str, subject: &str, error: sqlx::Error) -> SyncError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            SyncError::conflict(entity, subject)
        }
        _ => SyncError::store_with_source(format!("{entity} query failed"), error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::{ExternalId, Source};

    #[test]
    fn test_source_ids_predicate_shape() {
        let id_source = IdSource::new(Source::Crm, ExternalId::parse("S1").unwrap());
        assert_eq!(
            source_ids_predicate(&id_source),
            serde_json::json!([{ "source": "crm", "id": "S1" }])
        );
    }

    #[test]
    fn test_parse_source_ids_roundtrip() {
        let stored = serde_json::json!([
            { "source": "crm", "id": "S1" },
            { "source": "auth", "id": "auth0|abc" },
        ]);
        let parsed = parse_source_ids(&stored).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].source, Source::Crm);
        assert_eq!(parsed[1].id.as_str(), "auth0|abc");
    }

    #[test]
    fn test_parse_source_ids_rejects_unknown_source() {
        let stored = serde_json::json!([{ "source": "dynamo", "id": "S1" }]);
        assert!(parse_source_ids(&stored).is_err());
    }
}
