//! Entities, relationships and the identifier rule that keys them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OwnergraphError, Result};

/// Id used when a name is missing or has no alphanumeric content.
pub const UNKNOWN_ID: &str = "unknown";

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("Invalid regex pattern"));

/// Kind of node in the ownership network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Owner,
    Company,
    MediaOutlet,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Owner => "owner",
            EntityKind::Company => "company",
            EntityKind::MediaOutlet => "media_outlet",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type carried on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Owns,
    IndirectOwns,
    FamilyRelation,
    Spouse,
    Child,
    Sibling,
    Parent,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Owns => "owns",
            RelationType::IndirectOwns => "indirect_owns",
            RelationType::FamilyRelation => "family_relation",
            RelationType::Spouse => "spouse",
            RelationType::Child => "child",
            RelationType::Sibling => "sibling",
            RelationType::Parent => "parent",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owner, company or media outlet.
///
/// Serialized field order doubles as the column order of the owner and
/// entity tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub media_type: Option<String>,
}

impl Entity {
    /// Build an entity whose id is derived from `name`.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        let name = name.into();
        Self {
            id: normalize_id(&name),
            name,
            kind,
            description: None,
            image_url: None,
            media_type: None,
        }
    }

    pub fn owner(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Owner)
    }

    pub fn company(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Company)
    }

    pub fn media_outlet(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::MediaOutlet)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn is_owner(&self) -> bool {
        self.kind == EntityKind::Owner
    }
}

/// A directed, typed, weighted relationship (source --type--> target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub percentage: f64,
    pub description: String,
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_type: RelationType,
        percentage: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type,
            percentage,
            description: description.into(),
        }
    }

    /// Direct `owns` relationship with the standard description.
    pub fn owns(
        source_id: impl Into<String>,
        target: &Entity,
        percentage: f64,
    ) -> Self {
        let description = format!("Owns {}% of {}", format_percentage(percentage), target.name);
        Self::new(source_id, target.id.clone(), RelationType::Owns, percentage, description)
    }

    /// Derived `indirect_owns` relationship; the percentage is shown with two decimals.
    pub fn indirect_owns(
        source_id: impl Into<String>,
        target: &Entity,
        percentage: f64,
    ) -> Self {
        let description = format!("Indirectly owns {:.2}% of {}", percentage, target.name);
        Self::new(
            source_id,
            target.id.clone(),
            RelationType::IndirectOwns,
            percentage,
            description,
        )
    }
}

/// Map a free-text name to its canonical id.
///
/// Runs of characters outside `[A-Za-z0-9]` become a single `_`, the result
/// is lower-cased and trimmed of `_`. Empty results map to [`UNKNOWN_ID`].
pub fn normalize_id(name: &str) -> String {
    let replaced = NON_ALNUM.replace_all(name, "_");
    let lowered = replaced.to_lowercase();
    let trimmed = lowered.trim_matches('_');
    if trimmed.is_empty() {
        UNKNOWN_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

/// [`normalize_id`] for a possibly missing name.
pub fn normalize_optional_id(name: Option<&str>) -> String {
    name.map(normalize_id).unwrap_or_else(|| UNKNOWN_ID.to_string())
}

/// Parse percentage text such as `"60%"`, `" 12.5 % "` or `"100"`.
pub fn parse_percentage(text: &str) -> Result<f64> {
    let cleaned = text.replace('%', "");
    let cleaned = cleaned.trim();
    let value: f64 = cleaned
        .parse()
        .map_err(|_| OwnergraphError::NonNumericPercentage(text.to_string()))?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(OwnergraphError::PercentageOutOfRange(value));
    }
    Ok(value)
}

/// Render a stake for descriptions: whole numbers keep one decimal (`60.0`).
pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
