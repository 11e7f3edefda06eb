//! Redirect resolution.
//!
//! Resolution order for an incoming `(path, locale)`:
//! 1. direct canonical match — served from a `(locale, path) → page id`
//!    index maintained incrementally on writes;
//! 2. redirect-table match (`RedirectEntry` rows, surviving page deletion);
//! 3. page-embedded redirect match (`page.redirects`);
//! 4. not found.
//!
//! The linear scans over the page collection remain available as the
//! semantic reference implementation; tests cross-check the index against
//! them.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::model::{Page, RedirectEntry};

/// HTTP status attached to every redirect answer.
pub const REDIRECT_STATUS: u16 = 301;

/// Incrementally-maintained `(locale, path) → page id` index.
///
/// Rebuilt from the full page collection at startup; updated on every write
/// that touches a page's path map. Lock poisoning is unrecoverable
/// corruption, so accessors propagate the panic.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: RwLock<HashMap<(String, String), Uuid>>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything and re-index the given pages.
    pub fn rebuild<'a>(&self, pages: impl IntoIterator<Item = &'a Page>) {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
        for page in pages {
            for (locale, path) in &page.paths {
                entries.insert((locale.clone(), path.clone()), page.id);
            }
        }
    }

    /// Index every canonical path of a page.
    pub fn index_page(&self, page: &Page) {
        let mut entries = self.entries.write().unwrap();
        for (locale, path) in &page.paths {
            entries.insert((locale.clone(), path.clone()), page.id);
        }
    }

    /// Remove every canonical path of a page.
    pub fn forget_page(&self, page: &Page) {
        let mut entries = self.entries.write().unwrap();
        for (locale, path) in &page.paths {
            entries.remove(&(locale.clone(), path.clone()));
        }
    }

    pub fn remove(&self, locale: &str, path: &str) {
        self.entries
            .write()
            .unwrap()
            .remove(&(locale.to_string(), path.to_string()));
    }

    pub fn lookup(&self, locale: &str, path: &str) -> Option<Uuid> {
        self.entries
            .read()
            .unwrap()
            .get(&(locale.to_string(), path.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

/// The aggregate redirect table persisted as one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectTable {
    pub entries: Vec<RedirectEntry>,
}

impl RedirectTable {
    pub fn find(&self, locale: &str, from_path: &str) -> Option<&RedirectEntry> {
        self.entries
            .iter()
            .find(|e| e.locale == locale && e.from_path == from_path)
    }

    /// Insert or replace the entry for `(locale, from_path)`.
    pub fn upsert(&mut self, entry: RedirectEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.locale == entry.locale && e.from_path == entry.from_path)
        {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Re-point every entry targeting `from` at `to`. Used when a page is
    /// deleted with a redirect target, so existing chains flatten to a
    /// single hop instead of dangling.
    pub fn repoint(&mut self, from: Uuid, to: Uuid) {
        for entry in &mut self.entries {
            if entry.to_page_id == from {
                entry.to_page_id = to;
            }
        }
    }

    /// Drop every entry targeting the given page. Used when a page is
    /// deleted without a redirect target — those entries can never resolve
    /// again.
    pub fn remove_target(&mut self, target: Uuid) {
        self.entries.retain(|e| e.to_page_id != target);
    }
}

/// Reference implementation of the direct canonical match: a linear scan
/// over all pages. The index must agree with this.
pub fn scan_for_path<'a>(pages: &'a [Page], path: &str, locale: &str) -> Option<&'a Page> {
    pages
        .iter()
        .find(|page| page.paths.get(locale).is_some_and(|p| p == path))
}

/// Reference implementation of the page-embedded redirect match. A page only
/// answers for locales it actually has a canonical path in.
pub fn scan_for_embedded_redirect<'a>(
    pages: &'a [Page],
    path: &str,
    locale: &str,
) -> Option<&'a Page> {
    pages.iter().find(|page| {
        page.paths.contains_key(locale) && page.redirects.iter().any(|r| r == path)
    })
}
