//! Query facade
//!
//! Entry point for building and running queries over one domain type:
//!
//! ```ignore
//! let q = QueryDomainType::new(&users);
//! let age = q.get("age")?;
//! let pred = q.between(&age, q.param("lo"), q.param("hi"))?;
//! let mut query = q.where_clause(pred)?.create_query();
//! query.bind("lo", 18).bind("hi", 30);
//! let rows = query.execute(&store)?;
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::config::PlannerConfig;
use crate::domain::DomainTypeHandler;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::store::{ScanResult, Store};

use super::candidate::CandidateSet;
use super::errors::{QueryError, QueryResult};
use super::explain::ExplainPlan;
use super::operand::{Operand, Parameter, Property};
use super::params::ParameterBindings;
use super::predicate::Predicate;
use super::selector::{IndexSelector, ScanPlan};

/// Builder for queries over one domain type
pub struct QueryDomainType<'d, D: DomainTypeHandler + ?Sized> {
    domain: &'d D,
    name: Arc<str>,
    config: PlannerConfig,
    predicate: Option<Predicate>,
}

impl<'d, D: DomainTypeHandler + ?Sized> QueryDomainType<'d, D> {
    pub fn new(domain: &'d D) -> Self {
        Self {
            domain,
            name: Arc::from(domain.name()),
            config: PlannerConfig::default(),
            predicate: None,
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn domain(&self) -> &'d D {
        self.domain
    }

    /// Property for a field of this domain type
    pub fn get(&self, field: &str) -> QueryResult<Property> {
        let id = self
            .domain
            .field_id(field)
            .ok_or_else(|| QueryError::unknown_field(&self.name, field))?;
        Ok(Property::new(Arc::clone(&self.name), id, field))
    }

    pub fn param(&self, name: &str) -> Parameter {
        Parameter::new(name)
    }

    pub fn equal(&self, property: &Property, other: impl Into<Operand>) -> QueryResult<Predicate> {
        property.equal(other)
    }

    pub fn between(
        &self,
        property: &Property,
        lower: impl Into<Operand>,
        upper: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.between(lower, upper)
    }

    pub fn greater_than(
        &self,
        property: &Property,
        other: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.greater_than(other)
    }

    pub fn greater_equal(
        &self,
        property: &Property,
        other: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.greater_equal(other)
    }

    pub fn less_than(
        &self,
        property: &Property,
        other: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.less_than(other)
    }

    pub fn less_equal(
        &self,
        property: &Property,
        other: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.less_equal(other)
    }

    pub fn in_list(
        &self,
        property: &Property,
        other: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        property.in_list(other)
    }

    pub fn and(&self, left: Predicate, right: Predicate) -> Predicate {
        left.and(right)
    }

    /// Sets the query's predicate; every property must belong to this domain type
    pub fn where_clause(mut self, predicate: Predicate) -> QueryResult<Self> {
        if let Some(other) = predicate.domains().into_iter().find(|d| *d != &*self.name) {
            return Err(QueryError::Usage(format!(
                "Predicate refers to domain type '{}', query is over '{}'",
                other, self.name
            )));
        }
        // Field ids must resolve to the same columns in this definition
        let leaves = predicate.leaves();
        let stale = leaves
            .iter()
            .filter_map(|leaf| leaf.property())
            .find(|p| self.domain.field_id(p.name()) != Some(p.field()));
        if let Some(p) = stale {
            return Err(QueryError::Usage(format!(
                "Property '{}' was not built from this definition of domain type '{}'",
                p.name(),
                self.name
            )));
        }
        self.predicate = Some(predicate);
        Ok(self)
    }

    /// Freezes the builder into an executable query
    pub fn create_query(self) -> Query<'d, D> {
        Query {
            domain: self.domain,
            predicate: self.predicate,
            bindings: ParameterBindings::new(),
            selector: IndexSelector::new(&self.config),
            log_plans: self.config.log_plans,
        }
    }
}

/// Marked candidates and the access path chosen from them
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub scan: ScanPlan,
    pub candidates: CandidateSet,
}

/// Executable query; parameters are bound between executions
pub struct Query<'d, D: DomainTypeHandler + ?Sized> {
    domain: &'d D,
    predicate: Option<Predicate>,
    bindings: ParameterBindings,
    selector: IndexSelector,
    log_plans: bool,
}

impl<'d, D: DomainTypeHandler + ?Sized> Query<'d, D> {
    /// Binds (or rebinds) a parameter value
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.bindings.bind(name, value);
        self
    }

    pub fn bindings(&self) -> &ParameterBindings {
        &self.bindings
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Marks fresh candidates and selects the access path
    pub fn plan(&self) -> QueryPlan {
        let fresh = CandidateSet::for_domain(self.domain);
        let candidates = match &self.predicate {
            Some(predicate) => predicate.mark_bounds(self.domain, fresh),
            None => fresh,
        };
        QueryPlan {
            scan: self.selector.select(&candidates),
            candidates,
        }
    }

    pub fn explain(&self) -> ExplainPlan {
        ExplainPlan::from_plan(self.domain.name(), &self.plan(), self.predicate.as_ref())
    }

    /// Plans and runs the query.
    ///
    /// Unbound parameters fail before the store is touched.
    pub fn execute<S: Store + ?Sized>(&self, store: &S) -> QueryResult<ScanResult> {
        let result = self.run(store);
        match &result {
            Ok(r) => {
                let returned = r.len().to_string();
                let scanned = r.scanned_count.to_string();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("domain", self.domain.name()),
                        ("returned", returned.as_str()),
                        ("scanned", scanned.as_str()),
                        ("target", r.target.as_str()),
                    ],
                );
            }
            Err(e) => {
                let message = e.to_string();
                log_event_with_fields(
                    Event::QueryRejected,
                    &[
                        ("code", e.code().code()),
                        ("domain", self.domain.name()),
                        ("message", message.as_str()),
                    ],
                );
            }
        }
        result
    }

    fn run<S: Store + ?Sized>(&self, store: &S) -> QueryResult<ScanResult> {
        if let Some(predicate) = &self.predicate {
            self.bindings.check(predicate)?;
        }

        let plan = self.plan();
        self.log_plan(&plan.scan);

        let mut op = store.open_scan(self.domain.name(), &plan.scan.target())?;
        if let Some(predicate) = &self.predicate {
            self.selector
                .materialize(&plan.scan, predicate, self.domain, &self.bindings, op.as_mut())?;
        }
        Ok(op.execute()?)
    }

    fn log_plan(&self, scan: &ScanPlan) {
        let target = scan.target();
        let bound = scan.bound_column_count().to_string();
        let fields = [
            ("bound_columns", bound.as_str()),
            ("domain", self.domain.name()),
            ("index", target.index().unwrap_or("-")),
            ("target", target.as_str()),
        ];
        if self.log_plans {
            Logger::info(Event::QueryPlanned.as_str(), &fields);
        } else {
            log_event_with_fields(Event::QueryPlanned, &fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnType, DomainType, DomainTypeDef, IndexKind};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn users() -> DomainType {
        DomainType::try_from(
            DomainTypeDef::new("users")
                .with_column("id", ColumnType::Int)
                .with_column("age", ColumnType::Int)
                .with_primary_key(["id"])
                .with_index("by_age", IndexKind::Ordered, ["age"]),
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_field_is_usage_error() {
        let d = users();
        let q = QueryDomainType::new(&d);
        let err = q.get("email").unwrap_err();
        assert!(err.is_usage());
        assert!(format!("{}", err).contains("email"));
    }

    #[test]
    fn test_where_clause_rejects_foreign_domain() {
        let d = users();
        let other =
            DomainType::try_from(DomainTypeDef::new("orders").with_column("id", ColumnType::Int))
                .unwrap();

        let q = QueryDomainType::new(&d);
        let o = QueryDomainType::new(&other);
        let pred = o.equal(&o.get("id").unwrap(), o.param("id")).unwrap();

        assert!(q.where_clause(pred).err().unwrap().is_usage());
    }

    #[test]
    fn test_where_clause_rejects_same_name_other_layout() {
        let d = users();
        let other = DomainType::try_from(
            DomainTypeDef::new("users")
                .with_column("age", ColumnType::Int)
                .with_column("id", ColumnType::Int),
        )
        .unwrap();

        let o = QueryDomainType::new(&other);
        let pred = o.equal(&o.get("id").unwrap(), o.param("id")).unwrap();
        let err = QueryDomainType::new(&d).where_clause(pred).err().unwrap();
        assert!(err.is_usage());
        assert!(err.to_string().contains("'id'"));

        let o = QueryDomainType::new(&other);
        let same = users();
        let s = QueryDomainType::new(&same);
        let pred = s.equal(&s.get("age").unwrap(), s.param("age")).unwrap();
        assert!(QueryDomainType::new(&d).where_clause(pred).is_ok());
        assert!(o.where_clause(s.equal(&s.get("id").unwrap(), s.param("id")).unwrap()).is_err());
    }

    #[test]
    fn test_unbound_parameter_fails_before_storage() {
        let d = users();
        let store = MemoryStore::new();
        let q = QueryDomainType::new(&d);
        let age = q.get("age").unwrap();
        let pred = q.greater_than(&age, q.param("min")).unwrap();
        let query = q.where_clause(pred).unwrap().create_query();

        // The store has no 'users' table: reaching it would be a storage error
        let err = query.execute(&store).unwrap_err();
        assert_eq!(err, QueryError::UnboundParameter("min".into()));
    }

    #[test]
    fn test_query_without_predicate_scans_table() {
        let d = users();
        let mut store = MemoryStore::new();
        store.create_table(&d);
        store.insert("users", json!({"id": 1, "age": 30})).unwrap();

        let query = QueryDomainType::new(&d).create_query();
        assert!(query.plan().scan.is_table_scan());
        assert_eq!(query.execute(&store).unwrap().len(), 1);
    }
}
