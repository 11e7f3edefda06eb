//! Content engine façade.
//!
//! The single entry point combining the document store, block registry,
//! revision manager, redirect resolver and publication state machine. The
//! engine exclusively owns document mutation; the admin UI, public render
//! layer and AI editor all go through this API, with no privileged bypass.
//!
//! Every update is strictly sequential: read → snapshot → mutate → write.
//! There is no record-level locking; concurrent updates to the same id race
//! at the store and the last write wins (accepted for the single-process,
//! single-editor deployment target).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::blocks::BlockRegistry;
use crate::document::model::{
    BlockInstance, Category, Page, PageRevision, Post, PublishStatus, Publication, RedirectEntry,
    Seo, Site, TeamMember, PAGE_SCHEMA_VERSION, POST_SCHEMA_VERSION,
};
use crate::document::path as path_rules;
use crate::document::validate::validate_blocks;
use crate::error::{EngineError, EngineResult};
use crate::events::bus::EventBus;
use crate::events::types::ContentEvent;
use crate::publish;
use crate::redirect::{self, PathIndex, RedirectTable, REDIRECT_STATUS};
use crate::revision;
use crate::store::{DocumentKind, FileStore, CATEGORIES_FILE, REDIRECTS_FILE, SITE_FILE};

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub max_revisions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_revisions: revision::DEFAULT_MAX_REVISIONS,
        }
    }
}

/// Input for `create_page`. Status is always draft on creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePage {
    pub title: String,
    pub locale: String,
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    #[serde(default)]
    pub blocks: Vec<BlockInstance>,
    #[serde(default)]
    pub seo: Option<Seo>,
}

/// Partial update for `update_page`. Absent fields are left unchanged;
/// `"seo": null` clears the SEO metadata (double-Option pattern).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePage {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub paths: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub blocks: Option<Vec<BlockInstance>>,
    #[serde(default, with = "double_option")]
    pub seo: Option<Option<Seo>>,
}

impl UpdatePage {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.paths.is_none() && self.blocks.is_none() && self.seo.is_none()
    }
}

/// Serde helper distinguishing "absent" from "explicitly null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    pub title: String,
    pub slug: String,
    pub locale: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub seo: Option<Seo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub category_ids: Option<Vec<Uuid>>,
    #[serde(default, with = "double_option")]
    pub seo: Option<Option<Seo>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamMember {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// Sort order for page listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSort {
    #[default]
    UpdatedDesc,
    CreatedDesc,
    TitleAsc,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFilter {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub status: Option<PublishStatus>,
    #[serde(default)]
    pub sort: PageSort,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub status: Option<PublishStatus>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Answer from path resolution. A direct match carries no redirect fields; a
/// redirect match carries the current canonical path and a 301.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPage {
    pub page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// One row of the full redirect map handed to routing middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRedirect {
    pub from_path: String,
    pub locale: String,
    pub to_path: String,
    pub status_code: u16,
}

/// A published `(locale, path)` pair for static generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPath {
    pub locale: String,
    pub path: String,
}

/// Outcome of one scheduled-content sweep.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub pages_published: usize,
    pub posts_published: usize,
}

/// Aggregate record wrapping the category list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CategoryList {
    categories: Vec<Category>,
}

pub struct ContentEngine {
    store: FileStore,
    registry: Arc<BlockRegistry>,
    index: PathIndex,
    bus: EventBus,
    max_revisions: usize,
}

impl ContentEngine {
    /// Open (or create) the data directory, rebuild the path index from the
    /// page collection and return a ready engine. Collaborators are passed
    /// in explicitly; the engine holds no global state.
    pub async fn open(
        config: EngineConfig,
        registry: BlockRegistry,
        bus: EventBus,
    ) -> EngineResult<Self> {
        let store = FileStore::new(&config.data_dir);
        store.init().await?;

        let engine = Self {
            store,
            registry: Arc::new(registry),
            index: PathIndex::new(),
            bus,
            max_revisions: config.max_revisions,
        };

        let pages: Vec<Page> = engine.store.list(DocumentKind::Page).await?;
        engine.index.rebuild(&pages);
        info!(
            pages = pages.len(),
            indexed_paths = engine.index.len(),
            data_dir = %config.data_dir.display(),
            "content engine ready"
        );
        Ok(engine)
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    // ------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------

    pub async fn get_page(&self, id: Uuid) -> EngineResult<Page> {
        self.store
            .get(DocumentKind::Page, id)
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn get_pages(&self, filter: &PageFilter) -> EngineResult<Vec<Page>> {
        let mut pages: Vec<Page> = self.store.list(DocumentKind::Page).await?;

        if let Some(locale) = &filter.locale {
            pages.retain(|p| &p.locale == locale || p.paths.contains_key(locale));
        }
        if let Some(status) = filter.status {
            pages.retain(|p| p.publication.status == status);
        }

        match filter.sort {
            PageSort::UpdatedDesc => pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            PageSort::CreatedDesc => pages.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            PageSort::TitleAsc => pages.sort_by(|a, b| a.title.cmp(&b.title)),
        }

        let offset = filter.offset.min(pages.len());
        let mut pages = pages.split_off(offset);
        if let Some(limit) = filter.limit {
            pages.truncate(limit);
        }
        Ok(pages)
    }

    pub async fn create_page(&self, input: CreatePage) -> EngineResult<Page> {
        ensure_title(&input.title)?;
        ensure_locale(&input.locale)?;
        ensure_paths(&input.paths)?;
        self.ensure_paths_free(&input.paths, None)?;

        let mut blocks = input.blocks;
        self.tag_block_versions(&mut blocks);
        self.check_blocks(&blocks)?;

        let now = Utc::now();
        let page = Page {
            id: Uuid::new_v4(),
            schema_version: PAGE_SCHEMA_VERSION,
            locale: input.locale,
            title: input.title,
            paths: input.paths,
            redirects: Vec::new(),
            publication: Publication::default(),
            blocks,
            seo: input.seo,
            revisions: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.put(DocumentKind::Page, page.id, &page).await?;
        self.index.index_page(&page);
        self.bus.publish(ContentEvent::PageCreated { id: page.id });
        info!(page_id = %page.id, "page created");
        Ok(page)
    }

    /// Snapshot-then-mutate update. A change to any locale's canonical path
    /// appends the old path to the page's redirect list (deduplicated) so
    /// stale links keep resolving with a 301.
    pub async fn update_page(
        &self,
        id: Uuid,
        patch: UpdatePage,
        change_description: Option<&str>,
    ) -> EngineResult<Page> {
        self.update_page_by(id, patch, change_description, None).await
    }

    async fn update_page_by(
        &self,
        id: Uuid,
        patch: UpdatePage,
        change_description: Option<&str>,
        created_by: Option<&str>,
    ) -> EngineResult<Page> {
        let mut page = self.get_page(id).await?;

        if patch.is_empty() {
            // Nothing to change; no revision either.
            return Ok(page);
        }

        if let Some(title) = &patch.title {
            ensure_title(title)?;
        }
        if let Some(paths) = &patch.paths {
            ensure_paths(paths)?;
            self.ensure_paths_free(paths, Some(id))?;
        }
        let mut new_blocks = patch.blocks;
        if let Some(blocks) = &mut new_blocks {
            self.tag_block_versions(blocks);
            self.check_blocks(blocks)?;
        }

        let snapshot = revision::snapshot(&page, change_description, created_by);
        revision::append_and_cap(&mut page.revisions, snapshot, self.max_revisions);

        if let Some(title) = patch.title {
            page.title = title;
        }
        if let Some(new_paths) = patch.paths {
            for (locale, old_path) in page.paths.clone() {
                let changed = new_paths.get(&locale) != Some(&old_path);
                if changed {
                    if !page.redirects.contains(&old_path) {
                        page.redirects.push(old_path.clone());
                    }
                    self.index.remove(&locale, &old_path);
                }
            }
            page.paths = new_paths;
        }
        if let Some(blocks) = new_blocks {
            page.blocks = blocks;
        }
        if let Some(seo) = patch.seo {
            page.seo = seo;
        }

        page.updated_at = Utc::now();
        self.save_page(&mut page).await?;
        self.index.index_page(&page);
        self.bus.publish(ContentEvent::PageUpdated { id });
        info!(page_id = %id, "page updated");
        Ok(page)
    }

    /// Delete a page, optionally leaving 301s behind: with a redirect target,
    /// every current path and every embedded redirect of the deleted page
    /// becomes a redirect-table entry pointing at the target, and existing
    /// table entries targeting the deleted page are re-pointed so chains
    /// flatten to a single hop.
    pub async fn delete_page(&self, id: Uuid, redirect_to: Option<Uuid>) -> EngineResult<()> {
        if redirect_to == Some(id) {
            return Err(EngineError::Validation(
                "cannot redirect a page to itself".to_string(),
            ));
        }

        let page = self.get_page(id).await?;
        let mut table: RedirectTable = self.store.read_aggregate(REDIRECTS_FILE).await?;

        match redirect_to {
            Some(target_id) => {
                if self
                    .store
                    .get::<Page>(DocumentKind::Page, target_id)
                    .await?
                    .is_none()
                {
                    return Err(EngineError::Validation(
                        "redirect target page does not exist".to_string(),
                    ));
                }
                for (locale, path) in &page.paths {
                    table.upsert(RedirectEntry {
                        from_path: path.clone(),
                        to_page_id: target_id,
                        locale: locale.clone(),
                    });
                }
                for old_path in &page.redirects {
                    table.upsert(RedirectEntry {
                        from_path: old_path.clone(),
                        to_page_id: target_id,
                        locale: page.locale.clone(),
                    });
                }
                table.repoint(id, target_id);
            }
            None => {
                // Entries pointing at the deleted page can never resolve.
                table.remove_target(id);
            }
        }

        self.store.write_aggregate(REDIRECTS_FILE, &table).await?;
        self.store.delete(DocumentKind::Page, id).await?;
        self.index.forget_page(&page);
        self.bus.publish(ContentEvent::PageDeleted { id });
        info!(page_id = %id, redirected = redirect_to.is_some(), "page deleted");
        Ok(())
    }

    pub async fn publish_page(&self, id: Uuid) -> EngineResult<Page> {
        self.publish_page_at(id, Utc::now()).await
    }

    async fn publish_page_at(&self, id: Uuid, now: DateTime<Utc>) -> EngineResult<Page> {
        let mut page = self.get_page(id).await?;

        let snapshot = revision::snapshot(&page, Some("Published"), None);
        revision::append_and_cap(&mut page.revisions, snapshot, self.max_revisions);

        publish::publish(&mut page.publication, now);
        page.updated_at = now;
        self.save_page(&mut page).await?;
        self.bus.publish(ContentEvent::PagePublished { id });
        info!(page_id = %id, "page published");
        Ok(page)
    }

    pub async fn unpublish_page(&self, id: Uuid) -> EngineResult<Page> {
        let mut page = self.get_page(id).await?;
        publish::unpublish(&mut page.publication);
        page.updated_at = Utc::now();
        self.save_page(&mut page).await?;
        self.bus.publish(ContentEvent::PageUnpublished { id });
        info!(page_id = %id, "page unpublished");
        Ok(page)
    }

    pub async fn schedule_page(&self, id: Uuid, publish_at: DateTime<Utc>) -> EngineResult<Page> {
        let mut page = self.get_page(id).await?;
        publish::schedule(&mut page.publication, publish_at, Utc::now())?;
        page.updated_at = Utc::now();
        self.save_page(&mut page).await?;
        self.bus
            .publish(ContentEvent::PageScheduled { id, at: publish_at });
        info!(page_id = %id, at = %publish_at, "page scheduled");
        Ok(page)
    }

    /// Apply a past revision's snapshot as a new update. The pre-restore
    /// state is itself snapshotted, so restoring adds to history rather
    /// than rewriting it.
    pub async fn restore_revision(&self, page_id: Uuid, revision_id: Uuid) -> EngineResult<Page> {
        let page = self.get_page(page_id).await?;
        let restored = revision::restore(&page, revision_id)?;

        let patch = UpdatePage {
            title: Some(restored.title),
            paths: Some(restored.paths),
            blocks: Some(restored.blocks),
            seo: Some(restored.seo),
        };
        let updated = self
            .update_page_by(page_id, patch, Some("Restored revision"), None)
            .await?;
        self.bus.publish(ContentEvent::RevisionRestored {
            id: page_id,
            revision_id,
        });
        info!(page_id = %page_id, revision_id = %revision_id, "revision restored");
        Ok(updated)
    }

    pub async fn get_page_revisions(&self, id: Uuid) -> EngineResult<Vec<PageRevision>> {
        Ok(self.get_page(id).await?.revisions)
    }

    // ------------------------------------------------------------------
    // Path resolution
    // ------------------------------------------------------------------

    /// Resolve `(path, locale)` to a page: direct canonical match first,
    /// then the redirect table, then page-embedded redirects.
    pub async fn get_page_by_path(&self, path: &str, locale: &str) -> EngineResult<ResolvedPage> {
        // 1. Direct match via the index.
        if let Some(id) = self.index.lookup(locale, path) {
            if let Some(page) = self.store.get::<Page>(DocumentKind::Page, id).await? {
                if page.paths.get(locale).is_some_and(|p| p == path) {
                    return Ok(ResolvedPage {
                        page,
                        redirect_to: None,
                        status_code: None,
                    });
                }
            }
        }

        // 2. Redirect table.
        let table: RedirectTable = self.store.read_aggregate(REDIRECTS_FILE).await?;
        if let Some(entry) = table.find(locale, path) {
            if let Some(page) = self
                .store
                .get::<Page>(DocumentKind::Page, entry.to_page_id)
                .await?
            {
                if let Some(canonical) = page.paths.get(locale).cloned() {
                    return Ok(ResolvedPage {
                        page,
                        redirect_to: Some(canonical),
                        status_code: Some(REDIRECT_STATUS),
                    });
                }
            }
        }

        // 3. Page-embedded redirects.
        let pages: Vec<Page> = self.store.list(DocumentKind::Page).await?;
        if let Some(page) = redirect::scan_for_embedded_redirect(&pages, path, locale) {
            let canonical = page.paths.get(locale).cloned();
            return Ok(ResolvedPage {
                page: page.clone(),
                redirect_to: canonical,
                status_code: Some(REDIRECT_STATUS),
            });
        }

        Err(EngineError::NotFound)
    }

    /// Like `get_page_by_path`, but drafts and scheduled pages are never
    /// publicly resolvable regardless of path match.
    pub async fn get_published_page(&self, path: &str, locale: &str) -> EngineResult<ResolvedPage> {
        let resolved = self.get_page_by_path(path, locale).await?;
        if !resolved.page.publication.status.is_published() {
            return Err(EngineError::NotFound);
        }
        Ok(resolved)
    }

    /// The full resolved redirect map, for routing middleware. Table entries
    /// win over page-embedded redirects on `(locale, fromPath)` collisions.
    pub async fn get_redirects(&self) -> EngineResult<Vec<ResolvedRedirect>> {
        let mut map: BTreeMap<(String, String), ResolvedRedirect> = BTreeMap::new();
        let pages: Vec<Page> = self.store.list(DocumentKind::Page).await?;

        for page in &pages {
            for old_path in &page.redirects {
                for (locale, to_path) in &page.paths {
                    if old_path == to_path {
                        continue;
                    }
                    map.insert(
                        (locale.clone(), old_path.clone()),
                        ResolvedRedirect {
                            from_path: old_path.clone(),
                            locale: locale.clone(),
                            to_path: to_path.clone(),
                            status_code: REDIRECT_STATUS,
                        },
                    );
                }
            }
        }

        let table: RedirectTable = self.store.read_aggregate(REDIRECTS_FILE).await?;
        for entry in &table.entries {
            let Some(target) = self
                .store
                .get::<Page>(DocumentKind::Page, entry.to_page_id)
                .await?
            else {
                continue;
            };
            if let Some(to_path) = target.paths.get(&entry.locale) {
                map.insert(
                    (entry.locale.clone(), entry.from_path.clone()),
                    ResolvedRedirect {
                        from_path: entry.from_path.clone(),
                        locale: entry.locale.clone(),
                        to_path: to_path.clone(),
                        status_code: REDIRECT_STATUS,
                    },
                );
            }
        }

        Ok(map.into_values().collect())
    }

    /// Published `(locale, path)` pairs for static generation.
    pub async fn get_static_page_paths(&self) -> EngineResult<Vec<StaticPath>> {
        let pages: Vec<Page> = self.store.list(DocumentKind::Page).await?;
        let mut paths: Vec<StaticPath> = pages
            .iter()
            .filter(|p| p.publication.status.is_published())
            .flat_map(|p| {
                p.paths.iter().map(|(locale, path)| StaticPath {
                    locale: locale.clone(),
                    path: path.clone(),
                })
            })
            .collect();
        paths.sort_by(|a, b| (&a.locale, &a.path).cmp(&(&b.locale, &b.path)));
        Ok(paths)
    }

    // ------------------------------------------------------------------
    // Scheduled content sweep
    // ------------------------------------------------------------------

    /// Promote every scheduled page and post whose time has arrived, via the
    /// ordinary publish transition — the sweep produces the same revisioning
    /// side effects as a manual publish. One bad record never blocks the
    /// rest of the sweep.
    pub async fn process_scheduled_content(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let mut report = SweepReport::default();

        let pages: Vec<Page> = self.store.list(DocumentKind::Page).await?;
        for page in pages {
            if !publish::is_due(&page.publication, now) {
                continue;
            }
            match self.publish_page_at(page.id, now).await {
                Ok(_) => report.pages_published += 1,
                Err(err) => {
                    warn!(page_id = %page.id, error = %err, "sweep: failed to publish page");
                }
            }
        }

        let posts: Vec<Post> = self.store.list(DocumentKind::Post).await?;
        for post in posts {
            if !publish::is_due(&post.publication, now) {
                continue;
            }
            match self.publish_post_at(post.id, now).await {
                Ok(_) => report.posts_published += 1,
                Err(err) => {
                    warn!(post_id = %post.id, error = %err, "sweep: failed to publish post");
                }
            }
        }

        if report.pages_published + report.posts_published > 0 {
            info!(
                pages = report.pages_published,
                posts = report.posts_published,
                "scheduled content published"
            );
        }
        self.bus.publish(ContentEvent::SweepCompleted {
            pages_published: report.pages_published,
            posts_published: report.posts_published,
        });
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn get_post(&self, id: Uuid) -> EngineResult<Post> {
        self.store
            .get(DocumentKind::Post, id)
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn get_posts(&self, filter: &PostFilter) -> EngineResult<Vec<Post>> {
        let mut posts: Vec<Post> = self.store.list(DocumentKind::Post).await?;

        if let Some(locale) = &filter.locale {
            posts.retain(|p| &p.locale == locale);
        }
        if let Some(status) = filter.status {
            posts.retain(|p| p.publication.status == status);
        }
        if let Some(category_id) = filter.category_id {
            posts.retain(|p| p.category_ids.contains(&category_id));
        }

        // Newest first, by publish time where present.
        posts.sort_by(|a, b| {
            let a_key = a.publication.published_at.unwrap_or(a.created_at);
            let b_key = b.publication.published_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key)
        });

        let offset = filter.offset.min(posts.len());
        let mut posts = posts.split_off(offset);
        if let Some(limit) = filter.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    pub async fn create_post(&self, input: CreatePost) -> EngineResult<Post> {
        ensure_title(&input.title)?;
        ensure_locale(&input.locale)?;
        ensure_slug(&input.slug)?;
        self.ensure_slug_free(&input.slug, &input.locale, None).await?;

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            schema_version: POST_SCHEMA_VERSION,
            locale: input.locale,
            title: input.title,
            slug: input.slug,
            body: input.body,
            category_ids: input.category_ids,
            publication: Publication::default(),
            seo: input.seo,
            created_at: now,
            updated_at: now,
        };

        self.store.put(DocumentKind::Post, post.id, &post).await?;
        self.bus.publish(ContentEvent::PostCreated { id: post.id });
        info!(post_id = %post.id, "post created");
        Ok(post)
    }

    pub async fn update_post(&self, id: Uuid, patch: UpdatePost) -> EngineResult<Post> {
        let mut post = self.get_post(id).await?;

        if let Some(title) = &patch.title {
            ensure_title(title)?;
        }
        if let Some(slug) = &patch.slug {
            ensure_slug(slug)?;
            self.ensure_slug_free(slug, &post.locale, Some(id)).await?;
        }

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(slug) = patch.slug {
            post.slug = slug;
        }
        if let Some(body) = patch.body {
            post.body = body;
        }
        if let Some(category_ids) = patch.category_ids {
            post.category_ids = category_ids;
        }
        if let Some(seo) = patch.seo {
            post.seo = seo;
        }

        post.updated_at = Utc::now();
        self.save_post(&mut post).await?;
        self.bus.publish(ContentEvent::PostUpdated { id });
        info!(post_id = %id, "post updated");
        Ok(post)
    }

    pub async fn delete_post(&self, id: Uuid) -> EngineResult<()> {
        if !self.store.delete(DocumentKind::Post, id).await? {
            return Err(EngineError::NotFound);
        }
        self.bus.publish(ContentEvent::PostDeleted { id });
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    pub async fn publish_post(&self, id: Uuid) -> EngineResult<Post> {
        self.publish_post_at(id, Utc::now()).await
    }

    async fn publish_post_at(&self, id: Uuid, now: DateTime<Utc>) -> EngineResult<Post> {
        let mut post = self.get_post(id).await?;
        publish::publish(&mut post.publication, now);
        post.updated_at = now;
        self.save_post(&mut post).await?;
        self.bus.publish(ContentEvent::PostPublished { id });
        info!(post_id = %id, "post published");
        Ok(post)
    }

    pub async fn unpublish_post(&self, id: Uuid) -> EngineResult<Post> {
        let mut post = self.get_post(id).await?;
        publish::unpublish(&mut post.publication);
        post.updated_at = Utc::now();
        self.save_post(&mut post).await?;
        self.bus.publish(ContentEvent::PostUnpublished { id });
        info!(post_id = %id, "post unpublished");
        Ok(post)
    }

    pub async fn schedule_post(&self, id: Uuid, publish_at: DateTime<Utc>) -> EngineResult<Post> {
        let mut post = self.get_post(id).await?;
        publish::schedule(&mut post.publication, publish_at, Utc::now())?;
        post.updated_at = Utc::now();
        self.save_post(&mut post).await?;
        self.bus
            .publish(ContentEvent::PostScheduled { id, at: publish_at });
        info!(post_id = %id, at = %publish_at, "post scheduled");
        Ok(post)
    }

    // ------------------------------------------------------------------
    // Team members
    // ------------------------------------------------------------------

    pub async fn get_team_member(&self, id: Uuid) -> EngineResult<TeamMember> {
        self.store
            .get(DocumentKind::TeamMember, id)
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn get_team_members(&self) -> EngineResult<Vec<TeamMember>> {
        let mut members: Vec<TeamMember> = self.store.list(DocumentKind::TeamMember).await?;
        members.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.name.cmp(&b.name)));
        Ok(members)
    }

    pub async fn create_team_member(&self, input: CreateTeamMember) -> EngineResult<TeamMember> {
        if input.name.trim().is_empty() {
            return Err(EngineError::Validation("name cannot be empty".to_string()));
        }
        let now = Utc::now();
        let member = TeamMember {
            id: Uuid::new_v4(),
            schema_version: 1,
            name: input.name,
            role: input.role,
            bio: input.bio,
            photo: input.photo,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };
        self.store
            .put(DocumentKind::TeamMember, member.id, &member)
            .await?;
        info!(member_id = %member.id, "team member created");
        Ok(member)
    }

    pub async fn update_team_member(
        &self,
        id: Uuid,
        patch: UpdateTeamMember,
    ) -> EngineResult<TeamMember> {
        let mut member = self.get_team_member(id).await?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(EngineError::Validation("name cannot be empty".to_string()));
            }
            member.name = name;
        }
        if let Some(role) = patch.role {
            member.role = role;
        }
        if let Some(bio) = patch.bio {
            member.bio = bio;
        }
        if let Some(photo) = patch.photo {
            member.photo = Some(photo);
        }
        if let Some(sort_order) = patch.sort_order {
            member.sort_order = sort_order;
        }

        member.updated_at = Utc::now();
        self.store
            .put(DocumentKind::TeamMember, id, &member)
            .await?;
        info!(member_id = %id, "team member updated");
        Ok(member)
    }

    pub async fn delete_team_member(&self, id: Uuid) -> EngineResult<()> {
        if !self.store.delete(DocumentKind::TeamMember, id).await? {
            return Err(EngineError::NotFound);
        }
        info!(member_id = %id, "team member deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Categories and site config (aggregate records)
    // ------------------------------------------------------------------

    pub async fn get_categories(&self) -> EngineResult<Vec<Category>> {
        let list: CategoryList = self.store.read_aggregate(CATEGORIES_FILE).await?;
        Ok(list.categories)
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> EngineResult<Category> {
        ensure_slug(slug)?;
        let mut list: CategoryList = self.store.read_aggregate(CATEGORIES_FILE).await?;
        if list.categories.iter().any(|c| c.slug == slug) {
            return Err(EngineError::Validation(format!(
                "category slug '{slug}' already in use"
            )));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        list.categories.push(category.clone());
        self.store.write_aggregate(CATEGORIES_FILE, &list).await?;
        info!(category_id = %category.id, slug, "category created");
        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid) -> EngineResult<()> {
        let mut list: CategoryList = self.store.read_aggregate(CATEGORIES_FILE).await?;
        let before = list.categories.len();
        list.categories.retain(|c| c.id != id);
        if list.categories.len() == before {
            return Err(EngineError::NotFound);
        }
        self.store.write_aggregate(CATEGORIES_FILE, &list).await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    pub async fn get_site(&self) -> EngineResult<Site> {
        self.store.read_aggregate(SITE_FILE).await
    }

    pub async fn update_site(&self, site: Site) -> EngineResult<Site> {
        ensure_locale(&site.default_locale)?;
        for locale in &site.locales {
            ensure_locale(locale)?;
        }
        if !site.locales.contains(&site.default_locale) {
            return Err(EngineError::Validation(
                "default locale must be listed in locales".to_string(),
            ));
        }
        self.store.write_aggregate(SITE_FILE, &site).await?;
        info!("site config updated");
        Ok(site)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn save_page(&self, page: &mut Page) -> EngineResult<()> {
        // Lazy schema upgrade: any write stamps the current shape version.
        page.schema_version = PAGE_SCHEMA_VERSION;
        self.store.put(DocumentKind::Page, page.id, page).await
    }

    async fn save_post(&self, post: &mut Post) -> EngineResult<()> {
        post.schema_version = POST_SCHEMA_VERSION;
        self.store.put(DocumentKind::Post, post.id, post).await
    }

    /// Version 0 means "authored just now against the current schema".
    fn tag_block_versions(&self, blocks: &mut [BlockInstance]) {
        for instance in blocks {
            if instance.version == 0 {
                if let Some(definition) = self.registry.get(&instance.block_type) {
                    instance.version = definition.version;
                }
            }
        }
    }

    fn check_blocks(&self, blocks: &[BlockInstance]) -> EngineResult<()> {
        validate_blocks(blocks, &self.registry)
            .map_err(|err| EngineError::Validation(err.to_string()))
    }

    /// At-most-one canonical page per `(locale, path)`.
    fn ensure_paths_free(
        &self,
        paths: &BTreeMap<String, String>,
        exclude: Option<Uuid>,
    ) -> EngineResult<()> {
        for (locale, path) in paths {
            if let Some(owner) = self.index.lookup(locale, path) {
                if Some(owner) != exclude {
                    return Err(EngineError::Validation(format!(
                        "path '{path}' is already in use for locale '{locale}'"
                    )));
                }
            }
        }
        Ok(())
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        locale: &str,
        exclude: Option<Uuid>,
    ) -> EngineResult<()> {
        let posts: Vec<Post> = self.store.list(DocumentKind::Post).await?;
        let taken = posts
            .iter()
            .any(|p| p.slug == slug && p.locale == locale && Some(p.id) != exclude);
        if taken {
            return Err(EngineError::Validation(format!(
                "slug '{slug}' is already in use for locale '{locale}'"
            )));
        }
        Ok(())
    }
}

fn ensure_title(title: &str) -> EngineResult<()> {
    if title.trim().is_empty() {
        return Err(EngineError::Validation("title cannot be empty".to_string()));
    }
    Ok(())
}

fn ensure_locale(tag: &str) -> EngineResult<()> {
    if !path_rules::is_valid_locale(tag) {
        return Err(EngineError::Validation(format!(
            "'{tag}' is not a valid language-REGION locale tag"
        )));
    }
    Ok(())
}

fn ensure_slug(slug: &str) -> EngineResult<()> {
    if !path_rules::is_valid_slug(slug) {
        return Err(EngineError::Validation(format!(
            "'{slug}' is not a valid slug"
        )));
    }
    Ok(())
}

fn ensure_paths(paths: &BTreeMap<String, String>) -> EngineResult<()> {
    for (locale, path) in paths {
        ensure_locale(locale)?;
        if !path_rules::is_valid_path(path) {
            return Err(EngineError::Validation(format!(
                "'{path}' is not a valid URL path"
            )));
        }
    }
    Ok(())
}
