//! Validated value objects
//!
//! Constructor/check pairs that accept untyped input and return a
//! strongly typed value or a validation failure. Everything the engine
//! and the adapters exchange is built from these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Separator used in the packed `source#id` string form.
pub const ID_SOURCE_SEPARATOR: char = '#';

/// A validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// Requires exactly one `@` with a non-empty local part and a domain
    /// containing at least one dot. The value is lowercased.
    pub fn parse(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into().trim().to_lowercase();
        let mut parts = value.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.') => {
                Ok(Self(value))
            }
            _ => Err(CoreError::invalid(
                "email",
                format!("not a valid email address: {value}"),
            )),
        }
    }

    /// Get the normalized value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl FromStr for Email {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

/// A validated URL-safe slug, used to locate groups externally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    const MAX_LEN: usize = 64;

    /// Parse a slug.
    ///
    /// Lowercase alphanumerics and single interior hyphens only, up to
    /// 64 characters.
    pub fn parse(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > Self::MAX_LEN {
            return Err(CoreError::invalid(
                "slug",
                format!("must be 1-{} characters: {value}", Self::MAX_LEN),
            ));
        }
        let valid_chars = value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_chars
            || value.starts_with('-')
            || value.ends_with('-')
            || value.contains("--")
        {
            return Err(CoreError::invalid(
                "slug",
                format!("must be lowercase alphanumerics and single hyphens: {value}"),
            ));
        }
        Ok(Self(value))
    }

    /// Get the slug value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl FromStr for Slug {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

/// An identifier assigned to a record by an external system.
///
/// Opaque to rollcall; only its form is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    const MAX_LEN: usize = 128;

    /// Parse an external identifier.
    ///
    /// Non-empty, at most 128 characters, and free of whitespace and the
    /// `#` separator used by the packed `source#id` form.
    pub fn parse(value: impl Into<String>) -> CoreResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > Self::MAX_LEN {
            return Err(CoreError::invalid(
                "external_id",
                format!("must be 1-{} characters", Self::MAX_LEN),
            ));
        }
        if value.contains(char::is_whitespace) || value.contains(ID_SOURCE_SEPARATOR) {
            return Err(CoreError::invalid(
                "external_id",
                format!("must not contain whitespace or '{ID_SOURCE_SEPARATOR}': {value}"),
            ));
        }
        Ok(Self(value))
    }

    /// Get the identifier value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(value)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl FromStr for ExternalId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

/// An external system of record rollcall can reconcile with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// The CRM (system of record for people and organisations).
    Crm,
    /// The identity provider (accounts and credentials).
    Auth,
    /// The community platform.
    Community,
    /// The course platform.
    CoursePlatform,
}

impl Source {
    /// All known sources, in reconciliation order.
    pub const ALL: [Source; 4] = [
        Source::Crm,
        Source::Auth,
        Source::Community,
        Source::CoursePlatform,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Crm => "crm",
            Source::Auth => "auth",
            Source::Community => "community",
            Source::CoursePlatform => "course-platform",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.to_lowercase().as_str() {
            "crm" => Ok(Source::Crm),
            "auth" => Ok(Source::Auth),
            "community" => Ok(Source::Community),
            "course-platform" => Ok(Source::CoursePlatform),
            _ => Err(CoreError::invalid("source", format!("unknown source: {s}"))),
        }
    }
}

/// A record's identity at one external system: which system, and the id
/// that system assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdSource {
    /// The external system.
    pub source: Source,
    /// The id assigned by that system.
    pub id: ExternalId,
}

impl IdSource {
    /// Create an id/source pair.
    pub fn new(source: Source, id: ExternalId) -> Self {
        Self { source, id }
    }

    /// Pack into the single-string `source#id` form used on request
    /// surfaces and in the store.
    pub fn value(&self) -> String {
        format!("{}{}{}", self.source, ID_SOURCE_SEPARATOR, self.id)
    }

    /// Parse the packed `source#id` form.
    pub fn parse_value(value: &str) -> CoreResult<Self> {
        let (source, id) = value.split_once(ID_SOURCE_SEPARATOR).ok_or_else(|| {
            CoreError::invalid(
                "id_source",
                format!("expected 'source{ID_SOURCE_SEPARATOR}id': {value}"),
            )
        })?;
        Ok(Self {
            source: source.parse()?,
            id: ExternalId::parse(id)?,
        })
    }
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
