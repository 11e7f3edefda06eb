//! End-to-end engine scenarios against a real (temporary) data directory.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde_json::json;

use pagewright_core::blocks::BlockRegistry;
use pagewright_core::document::model::{BlockInstance, PublishStatus};
use pagewright_core::engine::{
    ContentEngine, CreatePage, CreatePost, EngineConfig, PageFilter, UpdatePage,
};
use pagewright_core::error::EngineError;
use pagewright_core::events::bus::EventBus;
use pagewright_core::events::types::ContentEvent;

async fn open_engine(dir: &tempfile::TempDir) -> ContentEngine {
    let config = EngineConfig {
        data_dir: dir.path().to_path_buf(),
        max_revisions: 20,
    };
    ContentEngine::open(
        config,
        BlockRegistry::with_builtin_types(),
        EventBus::default(),
    )
    .await
    .unwrap()
}

async fn engine() -> (tempfile::TempDir, ContentEngine) {
    let dir = tempfile::tempdir().unwrap();
    let engine = open_engine(&dir).await;
    (dir, engine)
}

fn page_input(title: &str, path: &str) -> CreatePage {
    CreatePage {
        title: title.to_string(),
        locale: "en-GB".to_string(),
        paths: BTreeMap::from([("en-GB".to_string(), path.to_string())]),
        blocks: vec![],
        seo: None,
    }
}

fn title_patch(title: &str) -> UpdatePage {
    UpdatePage {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

fn paths_patch(locale: &str, path: &str) -> UpdatePage {
    UpdatePage {
        paths: Some(BTreeMap::from([(locale.to_string(), path.to_string())])),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_and_fetch_page() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("About", "about")).await.unwrap();

    assert_eq!(page.publication.status, PublishStatus::Draft);
    assert!(page.revisions.is_empty());

    let fetched = engine.get_page(page.id).await.unwrap();
    assert_eq!(fetched.title, "About");
    assert_eq!(fetched.paths["en-GB"], "about");
}

#[tokio::test]
async fn revision_cap_keeps_the_most_recent() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("T0", "t")).await.unwrap();

    for i in 1..=25 {
        engine
            .update_page(page.id, title_patch(&format!("T{i}")), None)
            .await
            .unwrap();
    }

    let page = engine.get_page(page.id).await.unwrap();
    assert_eq!(page.title, "T25");
    assert_eq!(page.revisions.len(), 20);
    // Revisions record pre-update state, most recent first.
    assert_eq!(page.revisions[0].snapshot.title, "T24");
    assert_eq!(page.revisions[19].snapshot.title, "T5");
}

#[tokio::test]
async fn restore_appends_history_instead_of_rewriting() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("First", "p")).await.unwrap();
    engine
        .update_page(page.id, title_patch("Second"), Some("rename"))
        .await
        .unwrap();

    let page = engine.get_page(page.id).await.unwrap();
    assert_eq!(page.revisions.len(), 1);
    let revision_id = page.revisions[0].id;
    assert_eq!(page.revisions[0].snapshot.title, "First");

    let restored = engine.restore_revision(page.id, revision_id).await.unwrap();
    assert_eq!(restored.title, "First");
    // The pre-restore state became a new revision; nothing was dropped.
    assert_eq!(restored.revisions.len(), 2);
    assert_eq!(restored.revisions[0].snapshot.title, "Second");
    assert_eq!(
        restored.revisions[0].change_description.as_deref(),
        Some("Restored revision")
    );
}

#[tokio::test]
async fn restore_unknown_revision_is_not_found() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "p")).await.unwrap();
    let result = engine.restore_revision(page.id, uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(EngineError::NotFound)));
}

#[tokio::test]
async fn path_change_leaves_a_redirect_behind() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("About", "about")).await.unwrap();

    engine
        .update_page(page.id, paths_patch("en-GB", "about-us"), None)
        .await
        .unwrap();

    // Old path 301s to the new canonical path.
    let resolved = engine.get_page_by_path("about", "en-GB").await.unwrap();
    assert_eq!(resolved.page.id, page.id);
    assert_eq!(resolved.redirect_to.as_deref(), Some("about-us"));
    assert_eq!(resolved.status_code, Some(301));

    // New path resolves directly, no redirect.
    let direct = engine.get_page_by_path("about-us", "en-GB").await.unwrap();
    assert_eq!(direct.page.id, page.id);
    assert!(direct.redirect_to.is_none());
    assert!(direct.status_code.is_none());

    // The old path was recorded exactly once.
    let page = engine.get_page(page.id).await.unwrap();
    assert_eq!(page.redirects, vec!["about".to_string()]);
}

#[tokio::test]
async fn repeated_path_changes_do_not_duplicate_redirects() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "one")).await.unwrap();

    engine.update_page(page.id, paths_patch("en-GB", "two"), None).await.unwrap();
    engine.update_page(page.id, paths_patch("en-GB", "one"), None).await.unwrap();
    engine.update_page(page.id, paths_patch("en-GB", "two"), None).await.unwrap();

    let page = engine.get_page(page.id).await.unwrap();
    assert_eq!(page.redirects, vec!["one".to_string(), "two".to_string()]);

    // "one" still reaches the page via its embedded redirect.
    let resolved = engine.get_page_by_path("one", "en-GB").await.unwrap();
    assert_eq!(resolved.redirect_to.as_deref(), Some("two"));
}

#[tokio::test]
async fn duplicate_canonical_path_is_rejected() {
    let (_dir, engine) = engine().await;
    engine.create_page(page_input("A", "shared")).await.unwrap();

    let result = engine.create_page(page_input("B", "shared")).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn empty_path_is_the_homepage() {
    let (_dir, engine) = engine().await;
    let home = engine.create_page(page_input("Home", "")).await.unwrap();

    let resolved = engine.get_page_by_path("", "en-GB").await.unwrap();
    assert_eq!(resolved.page.id, home.id);
    assert!(resolved.redirect_to.is_none());
}

#[tokio::test]
async fn republish_refreshes_timestamp_and_records_revision() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "p")).await.unwrap();

    let first = engine.publish_page(page.id).await.unwrap();
    let first_published_at = first.publication.published_at.unwrap();
    assert_eq!(first.revisions.len(), 1);

    let second = engine.publish_page(page.id).await.unwrap();
    assert_eq!(second.publication.status, PublishStatus::Published);
    assert!(second.publication.published_at.unwrap() >= first_published_at);
    assert_eq!(second.revisions.len(), 2);
    assert_eq!(
        second.revisions[0].change_description.as_deref(),
        Some("Published")
    );
}

#[tokio::test]
async fn unpublish_returns_to_draft_and_keeps_published_at() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "p")).await.unwrap();
    let published = engine.publish_page(page.id).await.unwrap();
    let went_live = published.publication.published_at;

    let draft = engine.unpublish_page(page.id).await.unwrap();
    assert_eq!(draft.publication.status, PublishStatus::Draft);
    assert_eq!(draft.publication.published_at, went_live);
}

#[tokio::test]
async fn drafts_never_resolve_publicly() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("Draft", "draft-page")).await.unwrap();

    // Resolvable internally...
    assert!(engine.get_page_by_path("draft-page", "en-GB").await.is_ok());
    // ...but not publicly.
    assert!(matches!(
        engine.get_published_page("draft-page", "en-GB").await,
        Err(EngineError::NotFound)
    ));

    engine.publish_page(page.id).await.unwrap();
    assert!(engine.get_published_page("draft-page", "en-GB").await.is_ok());

    engine.unpublish_page(page.id).await.unwrap();
    assert!(matches!(
        engine.get_published_page("draft-page", "en-GB").await,
        Err(EngineError::NotFound)
    ));
}

#[tokio::test]
async fn schedule_then_sweep_publishes_when_due() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("Launch", "launch")).await.unwrap();

    let publish_at = Utc::now() + Duration::hours(1);
    let scheduled = engine.schedule_page(page.id, publish_at).await.unwrap();
    assert_eq!(scheduled.publication.status, PublishStatus::Scheduled);
    assert_eq!(scheduled.publication.scheduled_at, Some(publish_at));

    // Before the scheduled time nothing changes.
    let report = engine
        .process_scheduled_content(publish_at - Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(report.pages_published, 0);
    let page_state = engine.get_page(page.id).await.unwrap();
    assert_eq!(page_state.publication.status, PublishStatus::Scheduled);

    // At/after the scheduled time the ordinary publish transition runs.
    let report = engine
        .process_scheduled_content(publish_at + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(report.pages_published, 1);

    let page_state = engine.get_page(page.id).await.unwrap();
    assert_eq!(page_state.publication.status, PublishStatus::Published);
    assert!(page_state.publication.published_at.is_some());
    assert!(page_state.publication.scheduled_at.is_none());
    // Sweep publishing is revisioned like a manual publish.
    assert_eq!(
        page_state.revisions[0].change_description.as_deref(),
        Some("Published")
    );
}

#[tokio::test]
async fn sweep_covers_posts_too() {
    let (_dir, engine) = engine().await;
    let post = engine
        .create_post(CreatePost {
            title: "News".to_string(),
            slug: "news".to_string(),
            locale: "en-GB".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let publish_at = Utc::now() + Duration::hours(2);
    engine.schedule_post(post.id, publish_at).await.unwrap();

    let report = engine
        .process_scheduled_content(publish_at + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(report.posts_published, 1);
    assert_eq!(
        engine.get_post(post.id).await.unwrap().publication.status,
        PublishStatus::Published
    );
}

#[tokio::test]
async fn scheduling_in_the_past_is_rejected() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "p")).await.unwrap();
    let result = engine
        .schedule_page(page.id, Utc::now() - Duration::minutes(1))
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn delete_with_redirect_survives_the_page() {
    let (_dir, engine) = engine().await;
    let a = engine.create_page(page_input("A", "old-a")).await.unwrap();
    let b = engine.create_page(page_input("B", "b")).await.unwrap();

    engine.delete_page(a.id, Some(b.id)).await.unwrap();
    assert!(matches!(engine.get_page(a.id).await, Err(EngineError::NotFound)));

    // A's old path 301s to B's current canonical path.
    let resolved = engine.get_page_by_path("old-a", "en-GB").await.unwrap();
    assert_eq!(resolved.page.id, b.id);
    assert_eq!(resolved.redirect_to.as_deref(), Some("b"));
    assert_eq!(resolved.status_code, Some(301));
}

#[tokio::test]
async fn delete_redirect_chains_flatten() {
    let (_dir, engine) = engine().await;
    let a = engine.create_page(page_input("A", "a")).await.unwrap();
    let b = engine.create_page(page_input("B", "b")).await.unwrap();
    let c = engine.create_page(page_input("C", "c")).await.unwrap();

    engine.delete_page(a.id, Some(b.id)).await.unwrap();
    engine.delete_page(b.id, Some(c.id)).await.unwrap();

    // Both hops resolve to C in a single 301 each.
    let via_a = engine.get_page_by_path("a", "en-GB").await.unwrap();
    assert_eq!(via_a.page.id, c.id);
    assert_eq!(via_a.redirect_to.as_deref(), Some("c"));

    let via_b = engine.get_page_by_path("b", "en-GB").await.unwrap();
    assert_eq!(via_b.page.id, c.id);
}

#[tokio::test]
async fn delete_redirecting_to_self_is_rejected() {
    let (_dir, engine) = engine().await;
    let page = engine.create_page(page_input("P", "p")).await.unwrap();
    let result = engine.delete_page(page.id, Some(page.id)).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
    // Page still exists.
    assert!(engine.get_page(page.id).await.is_ok());
}

#[tokio::test]
async fn blocks_are_version_tagged_and_validated_on_write() {
    let (_dir, engine) = engine().await;

    let mut input = page_input("Blocky", "blocky");
    input.blocks = vec![BlockInstance {
        id: "b1".to_string(),
        block_type: "hero".to_string(),
        version: 0, // authored just now: tag with the registry's current version
        props: json!({"heading": "Welcome"}),
    }];
    let page = engine.create_page(input).await.unwrap();
    assert_eq!(page.blocks[0].version, 2);

    // Unknown block types are rejected at the write boundary.
    let patch = UpdatePage {
        blocks: Some(vec![BlockInstance {
            id: "b2".to_string(),
            block_type: "carousel".to_string(),
            version: 0,
            props: json!({}),
        }]),
        ..Default::default()
    };
    let result = engine.update_page(page.id, patch, None).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));

    // Missing required props are rejected too.
    let patch = UpdatePage {
        blocks: Some(vec![BlockInstance {
            id: "b3".to_string(),
            block_type: "hero".to_string(),
            version: 0,
            props: json!({"subheading": "no heading"}),
        }]),
        ..Default::default()
    };
    let result = engine.update_page(page.id, patch, None).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn static_paths_cover_only_published_pages() {
    let (_dir, engine) = engine().await;
    let published = engine.create_page(page_input("Pub", "pub")).await.unwrap();
    engine.create_page(page_input("Draft", "draft")).await.unwrap();
    engine.publish_page(published.id).await.unwrap();

    let paths = engine.get_static_page_paths().await.unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].locale, "en-GB");
    assert_eq!(paths[0].path, "pub");
}

#[tokio::test]
async fn redirect_map_merges_embedded_and_table_entries() {
    let (_dir, engine) = engine().await;
    let a = engine.create_page(page_input("A", "a-old")).await.unwrap();
    engine.update_page(a.id, paths_patch("en-GB", "a-new"), None).await.unwrap();

    let b = engine.create_page(page_input("B", "b")).await.unwrap();
    let target = engine.create_page(page_input("T", "t")).await.unwrap();
    engine.delete_page(b.id, Some(target.id)).await.unwrap();

    let map = engine.get_redirects().await.unwrap();
    let froms: Vec<&str> = map.iter().map(|r| r.from_path.as_str()).collect();
    assert!(froms.contains(&"a-old"));
    assert!(froms.contains(&"b"));
    assert!(map.iter().all(|r| r.status_code == 301));
}

#[tokio::test]
async fn page_filter_by_status() {
    let (_dir, engine) = engine().await;
    let a = engine.create_page(page_input("A", "a")).await.unwrap();
    engine.create_page(page_input("B", "b")).await.unwrap();
    engine.publish_page(a.id).await.unwrap();

    let published = engine
        .get_pages(&PageFilter {
            status: Some(PublishStatus::Published),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, a.id);

    let all = engine.get_pages(&PageFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn post_slugs_are_unique_per_locale() {
    let (_dir, engine) = engine().await;
    engine
        .create_post(CreatePost {
            title: "One".to_string(),
            slug: "news".to_string(),
            locale: "en-GB".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let duplicate = engine
        .create_post(CreatePost {
            title: "Two".to_string(),
            slug: "news".to_string(),
            locale: "en-GB".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(duplicate, Err(EngineError::Validation(_))));

    // Same slug in another locale is fine.
    let other_locale = engine
        .create_post(CreatePost {
            title: "Deux".to_string(),
            slug: "news".to_string(),
            locale: "fr-FR".to_string(),
            ..Default::default()
        })
        .await;
    assert!(other_locale.is_ok());
}

#[tokio::test]
async fn index_is_rebuilt_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let page_id = {
        let engine = open_engine(&dir).await;
        engine.create_page(page_input("Persist", "persist")).await.unwrap().id
    };

    let engine = open_engine(&dir).await;
    let resolved = engine.get_page_by_path("persist", "en-GB").await.unwrap();
    assert_eq!(resolved.page.id, page_id);
}

#[tokio::test]
async fn mutations_emit_events() {
    let (_dir, engine) = engine().await;
    let mut rx = engine.events().subscribe();

    let page = engine.create_page(page_input("E", "e")).await.unwrap();
    engine.publish_page(page.id).await.unwrap();

    assert!(matches!(
        rx.recv().await.unwrap(),
        ContentEvent::PageCreated { id } if id == page.id
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        ContentEvent::PagePublished { id } if id == page.id
    ));
}
