mod common;

use std::time::Duration;

use common::{lead, MemoryBackend};
use estate_engine::{FilterCriteria, SortDirection};
use estate_types::{EstateError, Lead, LeadStatus};
use pretty_assertions::assert_eq;
use serde_json::json;

fn backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    backend.seed(
        "leads",
        vec![
            lead("l1", "Alice", "new"),
            lead("l2", "Bob", "closed"),
            lead("l3", "Carol", "new"),
        ],
    );
    backend
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let backend = MemoryBackend::new();
    backend.seed(
        "leads",
        vec![lead("l1", "Alice", "new"), lead("l2", "Bob", "closed")],
    );
    let leads = backend.client().leads();

    let result = leads
        .list(&FilterCriteria::new().with_eq("status", "new"))
        .await
        .unwrap();

    let names: Vec<&str> = result.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Alice"]);
    assert_eq!(backend.calls(), vec!["GET /api/leads?status=new"]);
}

#[tokio::test]
async fn test_all_and_search_combined_locally() {
    let backend = backend();
    let leads = backend.client().leads();

    let criteria = FilterCriteria::new()
        .with_eq("status", "all")
        .with_search("  CAROL ")
        .sorted_by("name", SortDirection::Desc);
    let result = leads.list(&criteria).await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "l3");
}

#[tokio::test]
async fn test_invalid_enum_value_never_dispatched() {
    let backend = backend();
    let leads = backend.client().leads();

    let err = leads
        .list(&FilterCriteria::new().with_eq("status", "archived"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_lists_share_one_request() {
    let backend = backend().with_latency(Duration::from_millis(50));
    let client = backend.client();
    let (a, b) = (client.leads(), client.leads());

    let criteria = FilterCriteria::new();
    let (first, second) = tokio::join!(a.list(&criteria), b.list(&criteria));
    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(backend.count("GET"), 1);

    // fresh data comes from the cache
    a.list_all().await.unwrap();
    assert_eq!(backend.count("GET"), 1);
}

#[tokio::test]
async fn test_paged_list_shape() {
    let backend = backend();
    backend.paginate("leads");
    let all = backend.client().leads().list_all().await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_get_unknown_record_is_not_found() {
    let backend = backend();
    let err = backend.client().leads().get("l9").await.unwrap_err();
    assert_eq!(err, EstateError::NotFound("lead \"l9\"".into()));
}

#[tokio::test]
async fn test_create_invalidates_collection() {
    common::init_tracing();
    let backend = backend();
    let leads = backend.client().leads();
    assert_eq!(leads.list_all().await.unwrap().len(), 3);

    let mut body = lead("", "Dev", "new");
    body["priority"] = json!("urgent");
    let created = leads.create(&body).await.unwrap();
    assert_eq!(created.id, "new-1");
    assert_eq!(created.priority, estate_types::Priority::Urgent);

    assert_eq!(leads.list_all().await.unwrap().len(), 4);
    assert_eq!(backend.count("GET"), 2);
}

#[tokio::test]
async fn test_failed_update_keeps_cache_fresh() {
    let backend = backend();
    let leads = backend.client().leads();
    leads.list_all().await.unwrap();

    backend.fail_next("PATCH", EstateError::Mutation("lead is locked (409)".into()));
    let err = leads
        .update("l1", json!({ "status": "contacted" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "mutation");

    // no invalidation: the cached list is still served
    leads.list_all().await.unwrap();
    assert_eq!(backend.count("GET"), 1);
}

#[tokio::test]
async fn test_update_then_read_back() {
    let backend = backend();
    let leads = backend.client().leads();
    assert_eq!(leads.get("l1").await.unwrap().status, LeadStatus::New);

    let updated = leads
        .update("l1", json!({ "status": "contacted" }))
        .await
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Contacted);
    assert_eq!(leads.get("l1").await.unwrap().status, LeadStatus::Contacted);
}

#[tokio::test]
async fn test_update_requires_object_patch() {
    let backend = backend();
    let err = backend
        .client()
        .leads()
        .update("l1", json!("contacted"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_replace_checks_ids() {
    let backend = backend();
    let leads = backend.client().leads();
    let mut record: Lead = leads.get("l2").await.unwrap();
    record.name = "Robert".into();

    assert_eq!(leads.replace("l3", &record).await.unwrap_err().kind(), "validation");
    let replaced = leads.replace("l2", &record).await.unwrap();
    assert_eq!(replaced.name, "Robert");
}

#[tokio::test]
async fn test_delete_success_flag() {
    let backend = backend();
    let leads = backend.client().leads();

    leads.delete("l2").await.unwrap();
    assert_eq!(leads.list_all().await.unwrap().len(), 2);

    let err = leads.delete("l2").await.unwrap_err();
    assert_eq!(err, EstateError::Mutation("delete of lead l2 was rejected".into()));

    backend.reject_deletes();
    let err = leads.delete("l1").await.unwrap_err();
    assert_eq!(err, EstateError::Mutation("record is referenced".into()));
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_retried_before_surfacing() {
    let backend = backend();
    let leads = backend.client().leads();

    backend.fail_next("GET", EstateError::Network("connection reset".into()));
    assert_eq!(leads.list_all().await.unwrap().len(), 3);
    assert_eq!(backend.count("GET"), 2);
}
