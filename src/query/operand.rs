//! Predicate operands
//!
//! A `Property` names a field of the domain type; a `Parameter` is a value
//! placeholder bound at execution time. Comparisons always start from a
//! property and take parameters on the right-hand side: anything else is
//! rejected when the predicate is built.

use std::fmt;
use std::sync::Arc;

use crate::domain::FieldId;

use super::errors::{QueryError, QueryResult};
use super::predicate::{Leaf, Predicate};

/// Field of a domain type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    domain: Arc<str>,
    field: FieldId,
    name: String,
}

/// Late-bound value placeholder
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parameter {
    name: String,
}

/// Either operand kind, as accepted by the comparison methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Property(Property),
    Parameter(Parameter),
}

impl Operand {
    /// Returns the parameter, or a usage error naming `operation`
    fn into_parameter(self, operation: &str) -> QueryResult<Parameter> {
        match self {
            Operand::Parameter(p) => Ok(p),
            Operand::Property(_) => Err(QueryError::only_parameters(operation)),
        }
    }
}

impl From<Property> for Operand {
    fn from(p: Property) -> Self {
        Operand::Property(p)
    }
}

impl From<&Property> for Operand {
    fn from(p: &Property) -> Self {
        Operand::Property(p.clone())
    }
}

impl From<Parameter> for Operand {
    fn from(p: Parameter) -> Self {
        Operand::Parameter(p)
    }
}

impl From<&Parameter> for Operand {
    fn from(p: &Parameter) -> Self {
        Operand::Parameter(p.clone())
    }
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name)
    }
}

impl Property {
    pub(crate) fn new(domain: Arc<str>, field: FieldId, name: impl Into<String>) -> Self {
        Self {
            domain,
            field,
            name: name.into(),
        }
    }

    /// Name of the domain type this property belongs to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn leaf(&self, operation: &str, other: Operand) -> QueryResult<Leaf> {
        Ok(Leaf {
            property: self.clone(),
            param: other.into_parameter(operation)?,
        })
    }

    /// `self = other`
    pub fn equal(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("equal", other.into()).map(Predicate::Equal)
    }

    /// `lower <= self <= upper`
    pub fn between(
        &self,
        lower: impl Into<Operand>,
        upper: impl Into<Operand>,
    ) -> QueryResult<Predicate> {
        let lower = lower.into().into_parameter("between")?;
        let upper = upper.into().into_parameter("between")?;
        Ok(Predicate::Between {
            property: self.clone(),
            lower,
            upper,
        })
    }

    /// `self > other`
    pub fn greater_than(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("greaterThan", other.into()).map(Predicate::GreaterThan)
    }

    /// `self >= other`
    pub fn greater_equal(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("greaterEqual", other.into()).map(Predicate::GreaterEqual)
    }

    /// `self < other`
    pub fn less_than(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("lessThan", other.into()).map(Predicate::LessThan)
    }

    /// `self <= other`
    pub fn less_equal(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("lessEqual", other.into()).map(Predicate::LessEqual)
    }

    /// `self IN other`; the parameter must be bound to an array
    pub fn in_list(&self, other: impl Into<Operand>) -> QueryResult<Predicate> {
        self.leaf("in", other.into()).map(Predicate::In)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.name)
    }
}
