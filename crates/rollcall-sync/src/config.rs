//! Engine configuration
//!
//! An explicit configuration value threaded into the engines at
//! construction time. There is no ambient/global lookup.

use serde::{Deserialize, Serialize};

use rollcall_core::Source;

use crate::error::{SyncError, SyncResult};

/// Configuration for the reconciliation engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// The system of record consulted first; ex-nihilo creates are
    /// checked against it before fan-out.
    pub primary_source: Source,

    /// Sources members are reconciled with, in fan-out order.
    pub member_sources: Vec<Source>,

    /// Sources groups are reconciled with, in fan-out order.
    pub group_sources: Vec<Source>,
}

impl SyncConfig {
    /// Create a configuration with the given primary source and the
    /// default fan-out sets.
    pub fn new(primary_source: Source) -> Self {
        Self {
            primary_source,
            member_sources: Source::ALL.to_vec(),
            group_sources: vec![Source::Community, Source::CoursePlatform],
        }
    }

    /// Set the member fan-out sources.
    pub fn with_member_sources(mut self, sources: Vec<Source>) -> Self {
        self.member_sources = sources;
        self
    }

    /// Set the group fan-out sources.
    pub fn with_group_sources(mut self, sources: Vec<Source>) -> Self {
        self.group_sources = sources;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.member_sources.is_empty() {
            return Err(SyncError::internal("member_sources must not be empty"));
        }
        if !self.member_sources.contains(&self.primary_source) {
            return Err(SyncError::internal(format!(
                "primary source {} missing from member_sources",
                self.primary_source
            )));
        }
        if has_duplicates(&self.member_sources) || has_duplicates(&self.group_sources) {
            return Err(SyncError::internal("fan-out sources must be unique"));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(Source::Crm)
    }
}

fn has_duplicates(sources: &[Source]) -> bool {
    sources
        .iter()
        .enumerate()
        .any(|(i, s)| sources[..i].contains(s))
}
