//! Query Execution Tests
//!
//! End-to-end tests against the in-memory store:
//! - Chosen bounds narrow the scan, remaining leaves filter rows
//! - Excluded or unusable indexes fall back without changing results
//! - Parameter and type errors surface before or during the scan

use keyscan::config::{PlannerConfig, TieBreak};
use keyscan::domain::{ColumnType, DomainType, DomainTypeDef, IndexKind};
use keyscan::query::{QueryDomainType, QueryError, ScanPlan};
use keyscan::store::{BoundValue, MemoryStore, ScanTarget};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn orders() -> DomainType {
    DomainType::try_from(
        DomainTypeDef::new("orders")
            .with_column("id", ColumnType::Int)
            .with_column("customer", ColumnType::String)
            .with_column("status", ColumnType::String)
            .with_column("total", ColumnType::Int)
            .with_column("region", ColumnType::String)
            .with_primary_key(["id"])
            .with_index("by_customer_total", IndexKind::Ordered, ["customer", "total"])
            .with_index("by_status", IndexKind::Ordered, ["status"])
            .with_index("by_region", IndexKind::Ordered, ["region"]),
    )
    .unwrap()
}

fn store(domain: &DomainType) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.create_table(domain);
    let rows = [
        (1, "ann", "open", 120, "north"),
        (2, "ann", "shipped", 80, "south"),
        (3, "bob", "open", 300, "north"),
        (4, "ann", "open", 45, "east"),
        (5, "cat", "shipped", 150, "north"),
        (6, "bob", "cancelled", 90, "south"),
    ];
    for (id, customer, status, total, region) in rows {
        let row = json!({
            "id": id,
            "customer": customer,
            "status": status,
            "total": total,
            "region": region,
        });
        store.insert("orders", row).unwrap();
    }
    store
}

fn ids(records: &[Value]) -> Vec<i64> {
    records.iter().filter_map(|r| r["id"].as_i64()).collect()
}

// =============================================================================
// Access Path Tests
// =============================================================================

/// Primary key equality runs as a unique lookup.
#[test]
fn test_primary_key_lookup() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.equal(&q.get("id").unwrap(), q.param("id")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("id", 3);

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target, ScanTarget::UniqueLookup { index: "PRIMARY".into() });
    assert_eq!(ids(&result.records), vec![3]);
    assert_eq!(result.scanned_count, 1);
}

/// a = p1 AND b BETWEEN p2 AND p3 bounds both columns and needs no filter.
#[test]
fn test_equal_and_between_bound_scan() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q
        .get("customer")
        .unwrap()
        .equal(q.param("who"))
        .unwrap()
        .and(q.get("total").unwrap().between(q.param("lo"), q.param("hi")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("who", "ann").bind("lo", 45).bind("hi", 120);

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target.index(), Some("by_customer_total"));
    assert_eq!(result.filter_conditions, 0);
    assert_eq!(result.bounds.len(), 3);
    assert!(result.bounds[0].is_equal());
    // index order: total ascending within customer
    assert_eq!(ids(&result.records), vec![4, 2, 1]);
    assert_eq!(result.scanned_count, 3);
}

/// Leaves outside the chosen prefix still filter rows.
#[test]
fn test_unconsumed_leaves_become_filters() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q
        .get("status")
        .unwrap()
        .equal(q.param("status"))
        .unwrap()
        .and(q.get("total").unwrap().greater_than(q.param("min")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("status", "open").bind("min", 100);

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target.index(), Some("by_status"));
    assert_eq!(result.scanned_count, 3);
    assert_eq!(result.filter_conditions, 1);
    assert_eq!(ids(&result.records), vec![1, 3]);
}

/// A conflicting index is dropped; another index still returns correct rows.
#[test]
fn test_conflict_falls_back_to_alternate_index() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let customer = q.get("customer").unwrap();
    let pred = q
        .equal(&customer, q.param("who"))
        .unwrap()
        .and(q.greater_than(&customer, q.param("after")).unwrap())
        .and(q.equal(&q.get("region").unwrap(), q.param("region")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("who", "bob").bind("after", "alice").bind("region", "north");

    let plan = query.plan();
    assert!(plan.candidates.by_name("by_customer_total").unwrap().is_excluded());
    assert_eq!(plan.scan.target().index(), Some("by_region"));

    let result = query.execute(&store).unwrap();
    assert_eq!(result.filter_conditions, 2);
    assert_eq!(ids(&result.records), vec![3]);
}

/// When no index is usable every leaf filters a table scan.
#[test]
fn test_table_scan_fallback() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q
        .get("total")
        .unwrap()
        .less_equal(q.param("max"))
        .unwrap()
        .and(q.get("total").unwrap().greater_equal(q.param("min")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("max", 100).bind("min", 80);

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target, ScanTarget::TableScan);
    assert_eq!(result.scanned_count, 6);
    assert_eq!(ids(&result.records), vec![2, 6]);
}

/// A repeated equality narrows on the first leaf and filters on the second.
#[test]
fn test_repeated_equal_filters_second_leaf() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let customer = q.get("customer").unwrap();
    let pred = q
        .equal(&customer, q.param("first"))
        .unwrap()
        .and(q.equal(&customer, q.param("second")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();

    query.bind("first", "ann").bind("second", "ann");
    let result = query.execute(&store).unwrap();
    assert_eq!(result.target.index(), Some("by_customer_total"));
    assert_eq!(result.filter_conditions, 1);
    assert_eq!(ids(&result.records), vec![4, 2, 1]);

    query.bind("second", "bob");
    assert!(query.execute(&store).unwrap().is_empty());
}

/// A range over the primary key scans it instead of the whole table.
#[test]
fn test_primary_key_range_scan() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.greater_equal(&q.get("id").unwrap(), q.param("min")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("min", 5);

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target, ScanTarget::IndexScan { index: "PRIMARY".into() });
    assert_eq!(ids(&result.records), vec![5, 6]);
    assert_eq!(result.scanned_count, 2);
}

// =============================================================================
// In-List Tests
// =============================================================================

/// An in-list on the leading column drives a multi-value scan.
#[test]
fn test_in_list_bound() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.in_list(&q.get("status").unwrap(), q.param("states")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("states", json!(["cancelled", "shipped"]));

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target.index(), Some("by_status"));
    assert!(matches!(result.bounds[0].value, BoundValue::InList(ref v) if v.len() == 2));
    assert_eq!(ids(&result.records), vec![6, 2, 5]);
}

/// An in-list that is not consumed becomes an OR group filter.
#[test]
fn test_in_list_filter() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.in_list(&q.get("total").unwrap(), q.param("totals")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("totals", json!([80, 300, 999]));

    let result = query.execute(&store).unwrap();
    assert_eq!(result.target, ScanTarget::TableScan);
    assert_eq!(result.filter_conditions, 3);
    assert_eq!(ids(&result.records), vec![2, 3]);

    query.bind("totals", json!([]));
    assert!(query.execute(&store).unwrap().is_empty());
}

/// In followed by equal on one index: the index is skipped, results stay correct.
#[test]
fn test_in_list_then_equal_falls_back() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q
        .in_list(&q.get("customer").unwrap(), q.param("who"))
        .unwrap()
        .and(q.equal(&q.get("total").unwrap(), q.param("total")).unwrap());
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("who", json!(["ann", "bob"])).bind("total", 90);

    let plan = query.plan();
    assert!(!plan.candidates.by_name("by_customer_total").unwrap().is_usable());
    assert_eq!(plan.scan, ScanPlan::TableScan);

    assert_eq!(ids(&query.execute(&store).unwrap().records), vec![6]);
}

/// The tie-break policy decides between a range tail and an in-list tail.
#[test]
fn test_tie_break_from_config() {
    let d = orders();
    let store = store(&d);

    for (tie_break, index) in [
        (TieBreak::PreferRange, "by_status"),
        (TieBreak::PreferInList, "by_region"),
    ] {
        let config = PlannerConfig::default().with_tie_break(tie_break);
        let q = QueryDomainType::new(&d).with_config(config);
        let pred = q
            .greater_equal(&q.get("status").unwrap(), q.param("s"))
            .unwrap()
            .and(q.in_list(&q.get("region").unwrap(), q.param("r")).unwrap());
        let mut query = q.where_clause(pred).unwrap().create_query();
        query.bind("s", "open").bind("r", json!(["north"]));

        let result = query.execute(&store).unwrap();
        assert_eq!(result.target.index(), Some(index));
        let mut found = ids(&result.records);
        found.sort();
        assert_eq!(found, vec![1, 3, 5]);
    }
}

// =============================================================================
// Error Tests
// =============================================================================

/// Every referenced parameter must be bound before execution.
#[test]
fn test_unbound_parameter() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q
        .get("total")
        .unwrap()
        .between(q.param("lo"), q.param("hi"))
        .unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("lo", 1);

    let err = query.execute(&store).unwrap_err();
    assert_eq!(err, QueryError::UnboundParameter("hi".into()));
    assert_eq!(err.code().code(), "QUERY_UNBOUND_PARAMETER");
}

/// An in-list parameter bound to a scalar is a usage error.
#[test]
fn test_in_list_needs_array() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.in_list(&q.get("status").unwrap(), q.param("states")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("states", "open");

    assert!(query.execute(&store).unwrap_err().is_usage());
}

/// Values that do not fit the column type are rejected.
#[test]
fn test_type_mismatch() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.equal(&q.get("id").unwrap(), q.param("id")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("id", "three");

    let err = query.execute(&store).unwrap_err();
    assert!(matches!(err, QueryError::TypeMismatch { ref column, .. } if column == "id"));
    assert!(!err.is_fatal());
}

/// Storage failures carry the storage error and are fatal.
#[test]
fn test_missing_table_is_storage_failure() {
    let d = orders();
    let empty = MemoryStore::new();
    let q = QueryDomainType::new(&d);
    let pred = q.equal(&q.get("id").unwrap(), q.param("id")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();
    query.bind("id", 1);

    let err = query.execute(&empty).unwrap_err();
    assert_eq!(err.code().code(), "QUERY_STORAGE_FAILED");
    assert!(err.is_fatal());
}

/// Rebinding parameters between executions replans from scratch.
#[test]
fn test_rebind_and_reexecute() {
    let d = orders();
    let store = store(&d);
    let q = QueryDomainType::new(&d);
    let pred = q.equal(&q.get("customer").unwrap(), q.param("who")).unwrap();
    let mut query = q.where_clause(pred).unwrap().create_query();

    query.bind("who", "ann");
    assert_eq!(query.execute(&store).unwrap().len(), 3);
    query.bind("who", "cat");
    assert_eq!(ids(&query.execute(&store).unwrap().records), vec![5]);
}
