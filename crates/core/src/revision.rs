//! Revision manager.
//!
//! Pure functions over a page's revision list. A snapshot records the page's
//! editable fields as they were *before* an update is applied, so restoring
//! a revision means "go back to what it was". Restore itself flows through
//! the normal update path and therefore produces a new revision — history is
//! linear and never rewritten.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::document::model::{BlockInstance, Page, PageRevision, RevisionSnapshot, Seo};
use crate::error::{EngineError, EngineResult};

/// Default retention cap for a page's revision list.
pub const DEFAULT_MAX_REVISIONS: usize = 20;

/// Deep-copy the editable fields of `page` into a new revision.
pub fn snapshot(
    page: &Page,
    change_description: Option<&str>,
    created_by: Option<&str>,
) -> PageRevision {
    PageRevision {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        created_by: created_by.map(str::to_string),
        change_description: change_description.map(str::to_string),
        snapshot: RevisionSnapshot {
            title: page.title.clone(),
            blocks: page.blocks.clone(),
            seo: page.seo.clone(),
            paths: Some(page.paths.clone()),
        },
    }
}

/// Prepend `revision` and truncate to `max_revisions`, keeping the most
/// recent. Eviction is by insertion order, not by created time.
pub fn append_and_cap(revisions: &mut Vec<PageRevision>, revision: PageRevision, max_revisions: usize) {
    revisions.insert(0, revision);
    revisions.truncate(max_revisions);
}

/// The fields a restore applies, via the ordinary update path.
#[derive(Debug, Clone)]
pub struct RestoredFields {
    pub title: String,
    pub blocks: Vec<BlockInstance>,
    pub seo: Option<Seo>,
    pub paths: BTreeMap<String, String>,
}

/// Look up a revision by id and return its snapshot fields. Revisions from
/// before paths were snapshotted fall back to the page's current paths.
pub fn restore(page: &Page, revision_id: Uuid) -> EngineResult<RestoredFields> {
    let revision = page
        .revisions
        .iter()
        .find(|r| r.id == revision_id)
        .ok_or(EngineError::NotFound)?;

    Ok(RestoredFields {
        title: revision.snapshot.title.clone(),
        blocks: revision.snapshot.blocks.clone(),
        seo: revision.snapshot.seo.clone(),
        paths: revision
            .snapshot
            .paths
            .clone()
            .unwrap_or_else(|| page.paths.clone()),
    })
}
