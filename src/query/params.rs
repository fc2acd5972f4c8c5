//! Runtime parameter values

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::predicate::Predicate;

/// Values bound to parameter names for one execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBindings {
    values: BTreeMap<String, Value>,
}

impl ParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds (or rebinds) a parameter
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Bound value of a parameter, or `UnboundParameter`
    pub fn require(&self, name: &str) -> QueryResult<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| QueryError::UnboundParameter(name.to_string()))
    }

    /// Bound elements of an `IN` parameter
    pub fn require_list(&self, name: &str) -> QueryResult<&[Value]> {
        match self.require(name)? {
            Value::Array(values) => Ok(values),
            _ => Err(QueryError::Usage(format!(
                "Parameter '{}' of an 'in' comparison must be bound to an array",
                name
            ))),
        }
    }

    /// Checks every parameter the predicate references before anything runs
    pub fn check(&self, predicate: &Predicate) -> QueryResult<()> {
        let mut result = Ok(());
        predicate.for_each_leaf(&mut |_, leaf| {
            if result.is_err() {
                return;
            }
            result = match leaf {
                Predicate::In(l) => self.require_list(l.param.name()).map(|_| ()),
                _ => leaf
                    .parameters()
                    .into_iter()
                    .try_for_each(|p| self.require(p.name()).map(|_| ())),
            };
        });
        result
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
