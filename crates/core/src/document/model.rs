use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Current on-disk shape version for `Page` records.
/// Older records are read as-is and stamped on their next write.
pub const PAGE_SCHEMA_VERSION: u32 = 2;

/// Current on-disk shape version for `Post` records.
pub const POST_SCHEMA_VERSION: u32 = 2;

/// Lifecycle state shared by pages and posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl PublishStatus {
    pub fn is_published(self) -> bool {
        matches!(self, PublishStatus::Published)
    }

    pub fn is_scheduled(self) -> bool {
        matches!(self, PublishStatus::Scheduled)
    }
}

/// Publication state embedded (flattened) in pages and posts.
///
/// `published_at` and `scheduled_at` are mutually exclusive in meaning: only
/// one is semantically active for a given status. `published_at` is retained
/// on unpublish as a record of the last time the document went live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub status: PublishStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// SEO metadata. Opaque to the engine; stored and returned verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

/// A typed, versioned unit of page content.
///
/// `version` records the block-schema version the props were authored against.
/// When it lags the registry's current version the instance is a migration
/// candidate: detected, never rewritten by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    /// 0 (or omitted) means "tag me with the registry's current version".
    #[serde(default)]
    pub version: u32,
    pub props: Value,
}

/// The editable fields of a page, deep-copied at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSnapshot {
    pub title: String,
    pub blocks: Vec<BlockInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<BTreeMap<String, String>>,
}

/// An immutable historical snapshot of a page's editable fields,
/// taken just before an update is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRevision {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    pub snapshot: RevisionSnapshot,
}

/// The central content document: locale-aware URL paths, composable blocks,
/// revision history and a draft/published/scheduled lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub schema_version: u32,
    /// The page's default locale (`language-REGION`).
    pub locale: String,
    pub title: String,
    /// locale → canonical URL path. Empty string is the locale's homepage.
    /// Exactly one canonical path per locale at any time.
    pub paths: BTreeMap<String, String>,
    /// Formerly-canonical paths, deduplicated. Each 301-resolves to the
    /// current canonical path for the requested locale.
    #[serde(default)]
    pub redirects: Vec<String>,
    #[serde(flatten)]
    pub publication: Publication,
    pub blocks: Vec<BlockInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    /// Most-recent-first, capped; eviction is by insertion order.
    #[serde(default)]
    pub revisions: Vec<PageRevision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A dated content document. Shares the publication lifecycle with pages but
/// carries no block composition, path map, redirects or revision history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub schema_version: u32,
    pub locale: String,
    pub title: String,
    pub slug: String,
    /// Markdown body, opaque to the engine.
    pub body: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub publication: Publication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub schema_version: u32,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Singleton site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    pub default_locale: String,
    pub locales: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<Seo>,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            name: String::new(),
            default_locale: "en-GB".to_string(),
            locales: vec!["en-GB".to_string()],
            seo: None,
        }
    }
}

/// A redirect stored independently of pages, so it survives the deletion of
/// its source page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectEntry {
    pub from_path: String,
    pub to_page_id: Uuid,
    pub locale: String,
}
