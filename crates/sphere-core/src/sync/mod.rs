//! Sync orchestration: pull every page from the directory, reconcile the
//! store, then rebuild the relationship edge set.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::contact::normalize::normalize;
use crate::directory::{DirectoryClient, DirectoryError, PageRequest};
use crate::error::{SphereError, SphereResult};
use crate::relationship::inference::InferenceEngine;
use crate::store::ContactStore;

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Contacts created by this run.
    pub imported: usize,
    /// Existing contacts refreshed by this run.
    pub updated: usize,
    /// Contacts removed because the directory reported them deleted.
    pub removed: usize,
    /// Records that could not be turned into a contact.
    pub discarded: usize,
    pub pages: usize,
    /// Edges written after inference.
    pub edges: usize,
    pub total_contacts: usize,
    /// Token stored for the next incremental run.
    pub sync_token: Option<String>,
}

/// Run one sync.
///
/// Every page is committed as soon as it is fetched. When a page fetch
/// fails the loop stops, relationships are still recomputed over what
/// was committed, and the result is a [`SphereError::PartialSync`]
/// carrying the report. The stored sync token only advances when the
/// final page was reached.
pub async fn run_sync<D, S>(directory: &D, store: &S, engine: &InferenceEngine) -> SphereResult<SyncReport>
where
    D: DirectoryClient + ?Sized,
    S: ContactStore + ?Sized,
{
    let mut report = SyncReport::default();
    let stored_token = store.get_sync_token().await?;

    let mut request = match stored_token {
        Some(token) => {
            info!(token = %token, "Starting incremental sync");
            PageRequest::incremental(token)
        }
        None => {
            info!("Starting full sync");
            PageRequest::full()
        }
    };

    let mut restarted = false;
    let mut failure: Option<DirectoryError> = None;

    loop {
        let page = match directory.fetch_page(&request).await {
            Ok(page) => page,
            Err(DirectoryError::SyncTokenExpired)
                if request.is_incremental() && request.page_token.is_none() && !restarted =>
            {
                warn!("Sync token expired, restarting as a full sync");
                restarted = true;
                request = PageRequest::full();
                continue;
            }
            Err(e) => {
                error!(page = report.pages + 1, error = %e, "Directory fetch failed, stopping sync");
                failure = Some(e);
                break;
            }
        };

        report.pages += 1;
        debug!(page = report.pages, records = page.records.len(), "Fetched directory page");
        report.discarded += page.undecodable;

        for raw in &page.records {
            if raw.is_deleted() {
                if let Some(id) = raw.contact_id() {
                    if store.delete_contact(&id).await? {
                        report.removed += 1;
                    }
                }
                continue;
            }

            match normalize(raw) {
                Some(contact) => {
                    if store.upsert_contact(&contact).await? {
                        report.imported += 1;
                    } else {
                        report.updated += 1;
                    }
                }
                None => report.discarded += 1,
            }
        }

        if page.is_last() {
            if let Some(token) = page.next_sync_token.as_deref().filter(|t| !t.is_empty()) {
                store.set_sync_token(token).await?;
            }
            break;
        }

        request = PageRequest {
            page_token: page.next_page_token,
            sync_token: request.sync_token,
        };
    }

    let contacts = store.get_contacts(None).await?;
    let edges = engine.infer_all_relationships(&contacts);
    store.clear_all_edges().await?;
    store.add_edges(&edges).await?;

    report.edges = edges.len();
    report.total_contacts = contacts.len();
    report.sync_token = store.get_sync_token().await?;

    info!(
        imported = report.imported,
        updated = report.updated,
        removed = report.removed,
        discarded = report.discarded,
        pages = report.pages,
        edges = report.edges,
        "Sync finished"
    );

    match failure {
        Some(source) => Err(SphereError::PartialSync { report: Box::new(report), source }),
        None => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::contact::raw::RawPerson;
    use crate::directory::DirectoryPage;
    use crate::relationship::model::RelationshipType;
    use crate::store::MemoryStore;

    fn person(id: &str, name: &str, org: Option<&str>, city: Option<&str>) -> RawPerson {
        let mut value = json!({
            "resourceName": format!("people/{id}"),
            "names": [{ "displayName": name }],
        });
        if let Some(org) = org {
            value["organizations"] = json!([{ "name": org }]);
        }
        if let Some(city) = city {
            value["addresses"] = json!([{ "city": city }]);
        }
        RawPerson::from_json(value).unwrap()
    }

    fn tombstone(id: &str) -> RawPerson {
        RawPerson::from_json(json!({
            "resourceName": format!("people/{id}"),
            "metadata": { "deleted": true },
        }))
        .unwrap()
    }

    /// Scripted directory keyed by page token ("" for the first page).
    #[derive(Default)]
    struct ScriptedDirectory {
        full: HashMap<String, Result<DirectoryPage, u16>>,
        incremental: HashMap<String, Result<DirectoryPage, u16>>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl ScriptedDirectory {
        fn page(records: Vec<RawPerson>, next: Option<&str>, sync: Option<&str>) -> DirectoryPage {
            DirectoryPage {
                records,
                next_page_token: next.map(str::to_string),
                next_sync_token: sync.map(str::to_string),
                ..DirectoryPage::default()
            }
        }
    }

    #[async_trait]
    impl DirectoryClient for ScriptedDirectory {
        async fn fetch_page(&self, request: &PageRequest) -> Result<DirectoryPage, DirectoryError> {
            self.requests.lock().unwrap().push(request.clone());
            let script = if request.is_incremental() { &self.incremental } else { &self.full };
            let key = request.page_token.clone().unwrap_or_default();
            match script.get(&key) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(410)) => Err(DirectoryError::SyncTokenExpired),
                Some(Err(status)) => Err(DirectoryError::Status { status: *status, body: "boom".into() }),
                None => Err(DirectoryError::Request(format!("unscripted page {key:?}"))),
            }
        }
    }

    fn three_page_directory() -> ScriptedDirectory {
        let mut dir = ScriptedDirectory::default();
        dir.full.insert(
            String::new(),
            Ok(ScriptedDirectory::page(
                vec![
                    person("a", "Alice", Some("Acme"), Some("Paris")),
                    person("b", "Bob", Some("acme"), None),
                ],
                Some("p2"),
                None,
            )),
        );
        dir.full.insert(
            "p2".into(),
            Ok(ScriptedDirectory::page(
                vec![person("c", "Carol", None, Some("paris")), RawPerson::default()],
                Some("p3"),
                None,
            )),
        );
        dir.full.insert(
            "p3".into(),
            Ok(ScriptedDirectory::page(vec![person("d", "Dan", None, None)], None, Some("sync-1"))),
        );
        dir
    }

    #[tokio::test]
    async fn test_undecodable_records_count_as_discarded() {
        let mut dir = ScriptedDirectory::default();
        let mut page = ScriptedDirectory::page(vec![person("a", "Alice", Some("Acme"), None)], None, Some("sync-1"));
        page.undecodable = 2;
        dir.full.insert(String::new(), Ok(page));

        let store = MemoryStore::new();
        let report = run_sync(&dir, &store, &InferenceEngine::default()).await.unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.discarded, 2);
        assert_eq!(report.total_contacts, 1);
    }

    #[tokio::test]
    async fn test_full_sync_imports_and_infers() {
        let dir = three_page_directory();
        let store = MemoryStore::new();
        let report = run_sync(&dir, &store, &InferenceEngine::default()).await.unwrap();

        assert_eq!(report.imported, 4);
        assert_eq!(report.updated, 0);
        assert_eq!(report.discarded, 1);
        assert_eq!(report.pages, 3);
        assert_eq!(report.total_contacts, 4);
        assert_eq!(report.sync_token.as_deref(), Some("sync-1"));

        let edges = store.get_edges(None).await.unwrap();
        assert_eq!(report.edges, edges.len());
        assert!(edges
            .iter()
            .any(|e| e.relationship_type == RelationshipType::Colleague && e.source_id == "a" && e.target_id == "b"));
        assert!(edges
            .iter()
            .any(|e| e.relationship_type == RelationshipType::Local && e.source_id == "a" && e.target_id == "c"));
    }

    #[tokio::test]
    async fn test_second_sync_is_incremental_and_idempotent() {
        let mut dir = three_page_directory();
        dir.incremental.insert(
            String::new(),
            Ok(ScriptedDirectory::page(
                vec![person("a", "Alice", Some("Acme"), Some("Paris"))],
                None,
                Some("sync-2"),
            )),
        );
        let store = MemoryStore::new();
        let engine = InferenceEngine::default();

        let first = run_sync(&dir, &store, &engine).await.unwrap();
        store.add_tag("a", "friend").await.unwrap();
        store.update_notes("a", "coffee on fridays").await.unwrap();

        let second = run_sync(&dir, &store, &engine).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(second.edges, first.edges);
        assert_eq!(second.sync_token.as_deref(), Some("sync-2"));
        {
            let requests = dir.requests.lock().unwrap();
            assert_eq!(requests.last().unwrap().sync_token.as_deref(), Some("sync-1"));
        }

        let alice = store.get_contact("a").await.unwrap().unwrap();
        assert!(alice.tags.contains("friend"));
        assert_eq!(alice.notes, "coffee on fridays");
    }

    #[tokio::test]
    async fn test_failure_mid_sync_keeps_committed_pages() {
        let mut dir = three_page_directory();
        dir.full.insert("p2".into(), Err(500));
        let store = MemoryStore::new();

        let err = run_sync(&dir, &store, &InferenceEngine::default()).await.unwrap_err();
        match err {
            SphereError::PartialSync { report, source } => {
                assert_eq!(report.imported, 2);
                assert_eq!(report.pages, 1);
                assert_eq!(report.sync_token, None);
                assert_eq!(report.edges, 1);
                assert!(matches!(source, DirectoryError::Status { status: 500, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(store.count_contacts().await.unwrap(), 2);
        assert_eq!(store.get_sync_token().await.unwrap(), None);
        assert_eq!(store.get_edges(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tombstones_remove_contacts() {
        let mut dir = three_page_directory();
        dir.incremental.insert(
            String::new(),
            Ok(ScriptedDirectory::page(vec![tombstone("b"), tombstone("zz")], None, Some("sync-2"))),
        );
        let store = MemoryStore::new();
        let engine = InferenceEngine::default();

        run_sync(&dir, &store, &engine).await.unwrap();
        let report = run_sync(&dir, &store, &engine).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.total_contacts, 3);
        assert!(store.get_contact("b").await.unwrap().is_none());
        let colleagues = store.get_edges(Some(RelationshipType::Colleague)).await.unwrap();
        assert!(colleagues.is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_restarts_full_fetch() {
        let mut dir = three_page_directory();
        dir.incremental.insert(String::new(), Err(410));
        let store = MemoryStore::new();
        store.set_sync_token("stale").await.unwrap();

        let report = run_sync(&dir, &store, &InferenceEngine::default()).await.unwrap();
        assert_eq!(report.imported, 4);
        assert_eq!(report.sync_token.as_deref(), Some("sync-1"));

        let requests = dir.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].is_incremental());
        assert!(!requests[1].is_incremental());
    }

    #[tokio::test]
    async fn test_unscripted_first_page_fails_without_token_advance() {
        let dir = three_page_directory();
        let store = MemoryStore::new();
        store.set_sync_token("unknown").await.unwrap();

        let err = run_sync(&dir, &store, &InferenceEngine::default()).await.unwrap_err();
        match err {
            SphereError::PartialSync { report, source } => {
                assert_eq!(report.pages, 0);
                assert_eq!(report.sync_token.as_deref(), Some("unknown"));
                assert!(matches!(source, DirectoryError::Request(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_edges_are_rebuilt_not_accumulated() {
        let mut dir = three_page_directory();
        dir.incremental.insert(String::new(), Ok(ScriptedDirectory::page(vec![], None, Some("sync-2"))));
        let store = MemoryStore::new();
        let engine = InferenceEngine::default();

        let first = run_sync(&dir, &store, &engine).await.unwrap();
        assert_eq!(first.edges, 2);

        // Alice loses her organization and city locally; the next run must drop her edges.
        store.upsert_contact(&crate::Contact::new("a", "Alice")).await.unwrap();
        let second = run_sync(&dir, &store, &engine).await.unwrap();
        assert_eq!(second.edges, 0);
        assert!(store.get_edges(None).await.unwrap().is_empty());
    }
}
