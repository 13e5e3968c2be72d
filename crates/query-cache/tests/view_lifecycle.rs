use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use estate_types::EstateError;
use pretty_assertions::assert_eq;
use query_cache::{CacheConfig, CacheKey, QueryCache, ViewScope};
use serde_json::{json, Value};

/// Shared backend state plus a request counter
#[derive(Clone, Default)]
struct Store {
    names: Arc<Mutex<Vec<String>>>,
    reads: Arc<AtomicUsize>,
}

impl Store {
    fn with(names: &[&str]) -> Self {
        let store = Store::default();
        *store.names.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        store
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn list(&self) -> Result<Value, EstateError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(json!(*self.names.lock().unwrap()))
    }
}

fn list_key() -> CacheKey {
    CacheKey::root("/api/leads")
}

#[tokio::test(start_paused = true)]
async fn test_write_then_list_shows_new_record() {
    let cache = QueryCache::default();
    let store = Store::with(&["Alice", "Bob"]);

    let s = store.clone();
    let key = list_key();
    let first = cache.fetch(&key, move || {
        let s = s.clone();
        async move { s.list().await }
    });
    assert_eq!(*first.await.unwrap(), json!(["Alice", "Bob"]));

    let s = store.clone();
    cache
        .mutate_and_invalidate(
            move || async move {
                s.names.lock().unwrap().push("Carol".into());
                Ok(json!({ "id": "l3" }))
            },
            &[list_key()],
        )
        .await
        .unwrap();

    let s = store.clone();
    let after = cache
        .fetch(&list_key(), move || {
            let s = s.clone();
            async move { s.list().await }
        })
        .await
        .unwrap();
    assert_eq!(*after, json!(["Alice", "Bob", "Carol"]));
    assert_eq!(store.reads(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_list_served_while_revalidating() {
    let cache = QueryCache::new(CacheConfig::default().with_stale_time(Duration::from_secs(5)));
    let store = Store::with(&["Alice"]);
    let load = |store: Store| {
        move || {
            let s = store.clone();
            async move { s.list().await }
        }
    };

    cache.fetch(&list_key(), load(store.clone())).await.unwrap();
    store.names.lock().unwrap().push("Bob".into());
    tokio::time::advance(Duration::from_secs(6)).await;

    // old data immediately, new data once the background fetch lands
    let stale = cache.fetch(&list_key(), load(store.clone())).await.unwrap();
    assert_eq!(*stale, json!(["Alice"]));
    assert!(cache.snapshot(&list_key()).await.is_fetching);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = cache.snapshot(&list_key()).await;
    assert_eq!(state.data.as_deref(), Some(&json!(["Alice", "Bob"])));
    assert!(!state.is_fetching);
}

#[tokio::test(start_paused = true)]
async fn test_view_scope_polls_until_closed() {
    let cache = QueryCache::default();
    let store = Store::with(&["Alice"]);

    let mut scope = ViewScope::new("leads-board", cache.clone());
    let s = store.clone();
    scope
        .poll(
            list_key(),
            move || {
                let s = s.clone();
                async move { s.list().await }
            },
            Duration::from_secs(30),
        )
        .unwrap();
    assert_eq!(scope.active_polls(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(store.reads(), 2);

    drop(scope);
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(store.reads(), 2);
    assert!(cache.snapshot(&list_key()).await.data.is_some());
}
