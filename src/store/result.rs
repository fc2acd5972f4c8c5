//! Result types for scan execution

use serde_json::Value;

use super::{BoundType, ScanTarget};

/// Value side of a bound pushed into a scan
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// Single-sided or equality bound
    Single(BoundType, Value),
    /// Multi-range bound, one equality range per value
    InList(Vec<Value>),
}

/// A bound as the storage engine received it
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedBound {
    /// Index column position
    pub position: usize,
    /// Index column name
    pub column: String,
    /// Bound kind and value(s)
    pub value: BoundValue,
}

impl AppliedBound {
    /// Returns true for an equality bound
    pub fn is_equal(&self) -> bool {
        matches!(self.value, BoundValue::Single(BoundType::Eq, _))
    }

    /// Returns true for a multi-value bound
    pub fn is_in_list(&self) -> bool {
        matches!(self.value, BoundValue::InList(_))
    }
}

/// Result of running a scan
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Matching records in scan order
    pub records: Vec<Value>,
    /// Access path the scan ran through
    pub target: ScanTarget,
    /// Bounds that narrowed the scan, in the order they were set
    pub bounds: Vec<AppliedBound>,
    /// Number of filter conditions evaluated per row
    pub filter_conditions: usize,
    /// Rows read after bound narrowing, before filtering
    pub scanned_count: usize,
}

impl ScanResult {
    /// Creates an empty result for the given target
    pub fn empty(target: ScanTarget) -> Self {
        Self {
            records: Vec::new(),
            target,
            bounds: Vec::new(),
            filter_conditions: 0,
            scanned_count: 0,
        }
    }

    /// Returns true if no records matched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns an iterator over the records
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.records.iter()
    }

    /// Collects one field of every record, in scan order
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.records
            .iter()
            .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scan_result_empty() {
        let result = ScanResult::empty(ScanTarget::TableScan);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert_eq!(result.scanned_count, 0);
    }

    #[test]
    fn test_column_projection() {
        let mut result = ScanResult::empty(ScanTarget::TableScan);
        result.records = vec![json!({"id": 1}), json!({"name": "x"})];
        assert_eq!(result.column("id"), vec![json!(1), Value::Null]);
    }

    #[test]
    fn test_applied_bound_kinds() {
        let eq = AppliedBound {
            position: 0,
            column: "a".into(),
            value: BoundValue::Single(BoundType::Eq, json!(1)),
        };
        assert!(eq.is_equal());
        assert!(!eq.is_in_list());

        let list = AppliedBound {
            position: 0,
            column: "a".into(),
            value: BoundValue::InList(vec![json!(1), json!(2)]),
        };
        assert!(list.is_in_list());
    }
}
