use super::*;
use crate::mutation::MutationState;
use crate::options::CountMode;
use crate::payload::{DeletePayload, GatewayRequest, InsertPayload, UpdatePayload};
use crate::result::GatewayResponse;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

// ── Shared RecordingTransport for tests ──

#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<(GatewayRequest, CallOptions)>>,
    response: Mutex<Option<GatewayResponse>>,
}

impl RecordingTransport {
    fn respond_with(&self, response: GatewayResponse) {
        *self.response.lock().unwrap() = Some(response);
    }

    fn record(&self, request: GatewayRequest, options: &CallOptions) -> GatewayResponse {
        self.requests.lock().unwrap().push((request, options.clone()));
        self.response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| GatewayResponse::from_body(200, json!([{ "id": 1 }, { "id": 2 }])))
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last(&self) -> (GatewayRequest, CallOptions) {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl GatewayTransport for RecordingTransport {
    async fn fetch(&self, payload: &FetchPayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Fetch(payload.clone()), options)
    }
    async fn insert(&self, payload: &InsertPayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Insert(payload.clone()), options)
    }
    async fn update(&self, payload: &UpdatePayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Update(payload.clone()), options)
    }
    async fn delete(&self, payload: &DeletePayload, options: &CallOptions) -> GatewayResponse {
        self.record(GatewayRequest::Delete(payload.clone()), options)
    }
}

fn builder_with(defaults: CallOptions) -> (QueryBuilder<RecordingTransport>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let builder = QueryBuilder::new("users", Arc::clone(&transport), Arc::new(defaults));
    (builder, transport)
}

fn builder() -> (QueryBuilder<RecordingTransport>, Arc<RecordingTransport>) {
    builder_with(CallOptions::new())
}

// ── Chain state ──

#[test]
fn test_conditions_keep_insertion_order() {
    let (mut qb, _) = builder();
    qb.eq("status", "active")
        .gt("age", 18)
        .in_list("role", ["admin", "owner"])
        .is("deleted_at", Scalar::Null)
        .or("a.eq.1,b.eq.2");

    let ops: Vec<Op> = qb.conditions().iter().map(Condition::operator).collect();
    assert_eq!(ops, vec![Op::Eq, Op::Gt, Op::In, Op::Is, Op::Or]);
    assert_eq!(qb.conditions()[0].column(), Some("status"));
    assert_eq!(qb.conditions()[4].column(), None);
}

#[test]
fn test_match_all_appends_eq_per_entry() {
    let (mut qb, _) = builder();
    let mut filters = BTreeMap::new();
    filters.insert("a", Scalar::from(1));
    filters.insert("b", Scalar::from("x"));
    qb.match_all(filters);

    let payload = qb.to_fetch_payload("*", None);
    assert_eq!(
        serde_json::to_value(payload.conditions).unwrap(),
        json!([
            { "column": "a", "operator": "eq", "value": 1 },
            { "column": "b", "operator": "eq", "value": "x" }
        ])
    );
}

#[test]
fn test_not_composes_expression() {
    let (mut qb, _) = builder();
    qb.not("status", Op::Eq, "archived");
    assert_eq!(
        serde_json::to_value(&qb.conditions()[0]).unwrap(),
        json!({ "operator": "not", "value": "status.eq.archived" })
    );
}

#[test]
fn test_range_sets_inclusive_window() {
    let (mut qb, _) = builder();
    qb.range(0, 9);
    assert_eq!(qb.offset_value(), Some(0));
    assert_eq!(qb.limit_value(), Some(10));

    qb.range(20, 29);
    assert_eq!(qb.offset_value(), Some(20));
    assert_eq!(qb.limit_value(), Some(10));

    // Inverted bounds are passed through as computed.
    qb.range(5, 4);
    assert_eq!(qb.limit_value(), Some(0));
}

#[test]
fn test_reset_clears_state() {
    let (mut qb, _) = builder();
    qb.eq("id", 1).limit(5).offset(10).group_by("day");
    qb.reset();
    assert!(qb.conditions().is_empty());
    assert_eq!(qb.limit_value(), None);
    assert_eq!(qb.offset_value(), None);
    assert_eq!(qb.to_fetch_payload("*", None).group_by, None);

    qb.page(2, 25).aggregate("amount", AggregationStrategy::CumulativeSum);
    qb.reset();
    assert_eq!(
        serde_json::to_value(qb.to_fetch_payload("*", None)).unwrap(),
        json!({ "table_name": "users", "columns": "*", "strip_nulls": true })
    );
}

#[test]
fn test_paging_and_aggregation_reach_fetch_payload() {
    let (mut qb, _) = builder();
    qb.group_by("created_at")
        .time_granularity(TimeGranularity::Day)
        .page(3, 50)
        .total_pages(10)
        .aggregate("amount", AggregationStrategy::CumulativeSum)
        .aggregation_dedup(true);

    assert_eq!(
        serde_json::to_value(qb.to_fetch_payload("created_at,amount", None)).unwrap(),
        json!({
            "table_name": "users",
            "columns": "created_at,amount",
            "current_page": 3,
            "page_size": 50,
            "total_pages": 10,
            "strip_nulls": true,
            "group_by": "created_at",
            "time_granularity": "day",
            "aggregation_column": "amount",
            "aggregation_strategy": "cumulative_sum",
            "aggregation_dedup": true
        })
    );
}

#[test]
fn test_fetch_payload_shape() {
    let (mut qb, _) = builder();
    assert_eq!(
        serde_json::to_value(qb.to_fetch_payload("*", None)).unwrap(),
        json!({ "table_name": "users", "columns": "*", "strip_nulls": true })
    );

    qb.eq("id", 7).limit(1);
    let options = CallOptions::new().strip_nulls(false);
    assert_eq!(
        serde_json::to_value(qb.to_fetch_payload(["id", "name"], Some(&options))).unwrap(),
        json!({
            "table_name": "users",
            "columns": ["id", "name"],
            "conditions": [{ "column": "id", "operator": "eq", "value": 7 }],
            "limit": 1,
            "strip_nulls": false
        })
    );
}

#[test]
fn test_client_default_strip_nulls_applies() {
    let (qb, _) = builder_with(CallOptions::new().strip_nulls(false));
    assert_eq!(qb.to_fetch_payload("*", None).strip_nulls, Some(false));

    let options = CallOptions::new().strip_nulls(true);
    assert_eq!(qb.to_fetch_payload("*", Some(&options)).strip_nulls, Some(true));
}

// ── Fetch ──

#[tokio::test]
async fn test_select_sends_snapshot_and_keeps_state() {
    let (mut qb, transport) = builder_with(CallOptions::new().user_id("u-1"));
    qb.eq("status", "active");

    let pending = qb.select("id");
    qb.eq("late", true);
    let result = pending.await;

    assert!(result.is_ok());
    assert_eq!(result.data, Some(json!([{ "id": 1 }, { "id": 2 }])));
    let (request, options) = transport.last();
    let GatewayRequest::Fetch(payload) = request else {
        panic!("expected fetch");
    };
    assert_eq!(payload.conditions.unwrap().len(), 1);
    assert_eq!(options.user_id.as_deref(), Some("u-1"));

    // State survives the terminal call.
    assert_eq!(qb.conditions().len(), 2);
}

#[tokio::test]
async fn test_select_with_overrides_defaults() {
    let (qb, transport) = builder_with(CallOptions::new().user_id("u-1").company_id("c-1"));
    let _ = qb.select_with("*", CallOptions::new().user_id("u-2")).await;
    let (_, options) = transport.last();
    assert_eq!(options.user_id.as_deref(), Some("u-2"));
    assert_eq!(options.company_id.as_deref(), Some("c-1"));
}

#[tokio::test]
async fn test_single_takes_first_row() {
    let (qb, transport) = builder();
    let result = qb.single("*").await;
    assert_eq!(result.data, Some(json!({ "id": 1 })));

    transport.respond_with(GatewayResponse::from_body(200, json!([])));
    let result = qb.maybe_single("*").await;
    assert_eq!(result.data, None);
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_fetch_failure_is_normalized() {
    let (qb, transport) = builder();
    transport.respond_with(GatewayResponse::from_body(400, json!({ "error": "unknown column" })));
    let result = qb.select("nope").await;
    assert_eq!(result.data, None);
    assert_eq!(result.error.as_deref(), Some("unknown column"));
    assert_eq!(result.status, 400);
}

// ── Mutations ──

#[tokio::test]
async fn test_insert_is_deferred_and_memoized() {
    let (qb, transport) = builder();
    let handle = qb.insert(json!({ "name": "Mordor" })).unwrap();
    assert_eq!(handle.state(), MutationState::Unrefined);
    assert_eq!(transport.calls(), 0);

    let first = handle.select("id,name").await;
    let second = handle.execute().await;
    let third = (&handle).await;
    let fourth = handle.clone().await;

    assert_eq!(transport.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(third, fourth);
    assert_eq!(handle.state(), MutationState::Resolved);
}

#[tokio::test]
async fn test_concurrent_triggers_share_one_request() {
    let (qb, transport) = builder();
    let handle = qb.update(json!({ "status": "done" })).unwrap();
    let (a, b, c) = tokio::join!(handle.execute(), handle.select("id"), handle.single("id"));
    assert_eq!(transport.calls(), 1);
    assert_eq!(a, b);
    assert_eq!(c.data, Some(json!({ "id": 1 })));
}

#[tokio::test]
async fn test_refinement_after_resolution_is_ignored() {
    let (qb, transport) = builder();
    let handle = qb.insert(json!({ "id": 1 })).unwrap();
    let _ = handle.select("id").await;
    let handle = handle.refine("name", Some(CallOptions::new().head(true)));
    let _ = handle.select_with("other", CallOptions::new().count(CountMode::Exact)).await;

    assert_eq!(transport.calls(), 1);
    let (request, _) = transport.last();
    let GatewayRequest::Insert(payload) = request else {
        panic!("expected insert");
    };
    assert_eq!(payload.columns, Some(Columns::from("id")));
    assert_eq!(payload.count, None);
    assert_eq!(payload.head, None);
}

#[tokio::test]
async fn test_refine_then_execute_uses_refinement() {
    let (qb, transport) = builder();
    let handle = qb
        .insert(json!({ "id": 1 }))
        .unwrap()
        .refine("id", Some(CallOptions::new().count(CountMode::Planned)));
    assert_eq!(handle.state(), MutationState::Refined);
    assert_eq!(transport.calls(), 0);

    let preview = handle.request();
    let _ = handle.execute().await;
    let (request, _) = transport.last();
    assert_eq!(request, preview);
    let GatewayRequest::Insert(payload) = request else {
        panic!("expected insert");
    };
    assert_eq!(payload.columns, Some(Columns::from("id")));
    assert_eq!(payload.count, Some(CountMode::Planned));
}

#[tokio::test]
async fn test_option_precedence_for_mutations() {
    let (qb, transport) = builder_with(
        CallOptions::new()
            .user_id("client")
            .company_id("client-co")
            .publish_event("client.event"),
    );
    let handle = qb
        .insert_with(
            json!({ "id": 1 }),
            CallOptions::new().user_id("call").company_id("call-co"),
        )
        .unwrap();
    let _ = handle
        .select_with("*", CallOptions::new().user_id("refined"))
        .await;

    let (_, options) = transport.last();
    assert_eq!(options.user_id.as_deref(), Some("refined"));
    assert_eq!(options.company_id.as_deref(), Some("call-co"));
    assert_eq!(options.publish_event.as_deref(), Some("client.event"));
}

#[tokio::test]
async fn test_update_snapshots_conditions() {
    let (mut qb, transport) = builder();
    qb.eq("id", 5);
    let handle = qb.update(json!({ "status": "done" })).unwrap();
    qb.eq("later", 1);
    let _ = handle.await;

    let (request, _) = transport.last();
    assert_eq!(
        request.to_json(),
        json!({
            "table_name": "users",
            "update_body": { "status": "done" },
            "conditions": [{ "column": "id", "operator": "eq", "value": 5 }],
            "columns": "*",
            "strip_nulls": true
        })
    );
}

#[tokio::test]
async fn test_upsert_forwards_conflict_target() {
    let (qb, transport) = builder();
    let handle = qb
        .upsert_with(
            json!([{ "id": 1, "name": "a" }]),
            UpsertOptions::new()
                .on_conflict(["id"])
                .update_body(json!({ "name": "a" })),
        )
        .unwrap();
    let _ = handle.returning("id").await;

    let (request, _) = transport.last();
    let GatewayRequest::Insert(payload) = request else {
        panic!("expected insert");
    };
    assert_eq!(payload.on_conflict, Some(Columns::from(["id"])));
    assert_eq!(payload.update_body, Some(json!({ "name": "a" })));
    assert_eq!(payload.columns, Some(Columns::from("id")));
}

#[test]
fn test_delete_requires_id_or_filter() {
    let (qb, transport) = builder();
    let err = qb.delete().unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("resource_id"));

    let err = qb
        .delete_with(DeleteOptions::new().resource_id(""))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_delete_resource_id_resolution() {
    let (mut qb, transport) = builder();
    qb.eq("id", 42);
    let _ = qb.delete().unwrap().await;
    let (request, _) = transport.last();
    let GatewayRequest::Delete(payload) = request else {
        panic!("expected delete");
    };
    assert_eq!(payload.resource_id.as_deref(), Some("42"));
    assert_eq!(payload.conditions.map(|c| c.len()), Some(1));

    let _ = qb
        .delete_with(DeleteOptions::new().resource_id("explicit"))
        .unwrap()
        .await;
    let (request, _) = transport.last();
    let GatewayRequest::Delete(payload) = request else {
        panic!("expected delete");
    };
    assert_eq!(payload.resource_id.as_deref(), Some("explicit"));
}

#[tokio::test]
async fn test_delete_by_filters_only() {
    let (mut qb, transport) = builder();
    qb.eq("resource_id", Scalar::Null).lt("age", 3);
    let _ = qb.delete().unwrap().await;
    let (request, _) = transport.last();
    let GatewayRequest::Delete(payload) = request else {
        panic!("expected delete");
    };
    assert_eq!(payload.resource_id, None);
    assert_eq!(payload.conditions.map(|c| c.len()), Some(2));
}

#[tokio::test]
async fn test_delete_uses_only_first_id_filter() {
    let (mut qb, transport) = builder();
    qb.eq("id", Scalar::Null).eq("resource_id", "r-9");
    let _ = qb.delete().unwrap().await;
    let (request, _) = transport.last();
    let GatewayRequest::Delete(payload) = request else {
        panic!("expected delete");
    };
    assert_eq!(payload.resource_id, None);
    assert_eq!(payload.conditions.map(|c| c.len()), Some(2));

    let (mut qb, transport) = builder();
    qb.eq("resource_id", "r-1").eq("id", 2);
    let _ = qb.delete().unwrap().await;
    let (request, _) = transport.last();
    let GatewayRequest::Delete(payload) = request else {
        panic!("expected delete");
    };
    assert_eq!(payload.resource_id.as_deref(), Some("r-1"));
}

#[test]
fn test_unserializable_values_are_rejected() {
    let (qb, transport) = builder();
    let mut row: BTreeMap<(i32, i32), Value> = BTreeMap::new();
    row.insert((1, 2), Value::Null);
    let err = qb.insert(row).unwrap_err();
    assert!(err.is_serialization());
    assert_eq!(transport.calls(), 0);
}
