//! Backend-agnostic metadata filter expressions.
//!
//! A [`FilterExpression`] is an immutable predicate tree over record metadata.
//! Leaves compare one field against a value; internal nodes combine children
//! with AND, OR and NOT.
//!
//! A query is evaluated either entirely by the backend or entirely on the
//! client. [`FilterPlan::for_capabilities`] makes that choice from a
//! [`CapabilityDescriptor`]:
//!
//! ```text
//! every leaf operator + every combinator supported natively → Native
//! anything missing                                         → ClientSide
//! ```
//!
//! Backends turn a native expression into their own query fragment by
//! implementing [`FilterTranslator`] and calling [`translate`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::StoreError;
use crate::types::{CapabilityDescriptor, FilterOperator, LogicalOperator, Metadata, MetadataValue};

/// Comparison applied to one metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum Comparison {
    Eq(MetadataValue),
    Ne(MetadataValue),
    In(Vec<MetadataValue>),
    Gt(MetadataValue),
    Gte(MetadataValue),
    Lt(MetadataValue),
    Lte(MetadataValue),
    Exists,
}

impl Comparison {
    /// Operator of this comparison.
    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        match self {
            Self::Eq(_) => FilterOperator::Eq,
            Self::Ne(_) => FilterOperator::Ne,
            Self::In(_) => FilterOperator::In,
            Self::Gt(_) => FilterOperator::Gt,
            Self::Gte(_) => FilterOperator::Gte,
            Self::Lt(_) => FilterOperator::Lt,
            Self::Lte(_) => FilterOperator::Lte,
            Self::Exists => FilterOperator::Exists,
        }
    }

    /// Evaluate against the field value (`None` when the key is absent).
    #[must_use]
    pub fn matches(&self, field: Option<&MetadataValue>) -> bool {
        match self {
            Self::Eq(value) => field.is_some_and(|f| contains_or_equals(f, value)),
            Self::Ne(value) => !field.is_some_and(|f| contains_or_equals(f, value)),
            Self::In(values) => {
                field.is_some_and(|f| values.iter().any(|value| contains_or_equals(f, value)))
            }
            Self::Gt(value) => ordered(field, value, |o| o == Ordering::Greater),
            Self::Gte(value) => ordered(field, value, |o| o != Ordering::Less),
            Self::Lt(value) => ordered(field, value, |o| o == Ordering::Less),
            Self::Lte(value) => ordered(field, value, |o| o != Ordering::Greater),
            Self::Exists => field.is_some(),
        }
    }
}

/// Equality that also matches an array field containing the value.
fn contains_or_equals(field: &MetadataValue, value: &MetadataValue) -> bool {
    if field.loose_eq(value) {
        return true;
    }
    match field {
        MetadataValue::Array(items) => items.iter().any(|item| item.loose_eq(value)),
        _ => false,
    }
}

fn ordered(field: Option<&MetadataValue>, value: &MetadataValue, accept: impl Fn(Ordering) -> bool) -> bool {
    field.and_then(|f| f.compare(value)).is_some_and(accept)
}

/// A predicate tree over metadata fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterExpression {
    /// Compare one field
    Condition {
        field: String,
        comparison: Comparison,
    },
    /// All children match (empty = true)
    And(Vec<FilterExpression>),
    /// Any child matches (empty = false)
    Or(Vec<FilterExpression>),
    /// Child does not match
    Not(Box<FilterExpression>),
}

impl FilterExpression {
    pub fn condition(field: impl Into<String>, comparison: Comparison) -> Self {
        Self::Condition {
            field: field.into(),
            comparison,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Eq(value.into()))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Ne(value.into()))
    }

    pub fn is_in<V: Into<MetadataValue>>(field: impl Into<String>, values: Vec<V>) -> Self {
        Self::condition(
            field,
            Comparison::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn gt(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Gt(value.into()))
    }

    pub fn gte(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Gte(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Lt(value.into()))
    }

    pub fn lte(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::condition(field, Comparison::Lte(value.into()))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Self::condition(field, Comparison::Exists)
    }

    /// Combine with another expression under AND.
    #[must_use]
    pub fn and(self, other: FilterExpression) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(other);
                Self::And(children)
            }
            first => Self::And(vec![first, other]),
        }
    }

    /// Combine with another expression under OR.
    #[must_use]
    pub fn or(self, other: FilterExpression) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(other);
                Self::Or(children)
            }
            first => Self::Or(vec![first, other]),
        }
    }

    /// Negate this expression.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// AND two optional expressions.
    #[must_use]
    pub fn conjoin(a: Option<FilterExpression>, b: Option<FilterExpression>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Self::And(vec![a, b])),
            (a, b) => a.or(b),
        }
    }

    /// Evaluate the whole tree against record metadata.
    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            Self::Condition { field, comparison } => comparison.matches(metadata.get(field)),
            Self::And(children) => children.iter().all(|child| child.matches(metadata)),
            Self::Or(children) => children.iter().any(|child| child.matches(metadata)),
            Self::Not(child) => !child.matches(metadata),
        }
    }

    /// Comparison operators used anywhere in the tree.
    #[must_use]
    pub fn operators(&self) -> BTreeSet<FilterOperator> {
        let mut ops = BTreeSet::new();
        self.visit(&mut |node| {
            if let Self::Condition { comparison, .. } = node {
                ops.insert(comparison.operator());
            }
        });
        ops
    }

    /// Combinators used anywhere in the tree.
    #[must_use]
    pub fn logical_operators(&self) -> BTreeSet<LogicalOperator> {
        let mut ops = BTreeSet::new();
        self.visit(&mut |node| match node {
            Self::And(_) => {
                ops.insert(LogicalOperator::And);
            }
            Self::Or(_) => {
                ops.insert(LogicalOperator::Or);
            }
            Self::Not(_) => {
                ops.insert(LogicalOperator::Not);
            }
            Self::Condition { .. } => {}
        });
        ops
    }

    /// Whether the backend can evaluate this whole tree natively.
    #[must_use]
    pub fn is_native_for(&self, capabilities: &CapabilityDescriptor) -> bool {
        capabilities.supports_filtering
            && self
                .operators()
                .iter()
                .all(|op| capabilities.supports_operator(*op))
            && self
                .logical_operators()
                .iter()
                .all(|op| capabilities.supports_logical(*op))
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a FilterExpression)) {
        f(self);
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Self::Not(child) => child.visit(f),
            Self::Condition { .. } => {}
        }
    }
}

/// Where a query's filter is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPlan<'a> {
    /// No filter
    Unfiltered,
    /// The backend evaluates the whole tree
    Native(&'a FilterExpression),
    /// The client evaluates the whole tree on fetched candidates
    ClientSide(&'a FilterExpression),
}

impl<'a> FilterPlan<'a> {
    /// Choose all-native or all-client evaluation for a query.
    #[must_use]
    pub fn for_capabilities(
        filter: Option<&'a FilterExpression>,
        capabilities: &CapabilityDescriptor,
    ) -> Self {
        match filter {
            None => Self::Unfiltered,
            Some(expr) if expr.is_native_for(capabilities) => Self::Native(expr),
            Some(expr) => Self::ClientSide(expr),
        }
    }

    /// Expression handed to the backend, if any.
    #[must_use]
    pub fn native(&self) -> Option<&'a FilterExpression> {
        match self {
            Self::Native(expr) => Some(expr),
            _ => None,
        }
    }
}

/// Emits a backend's native query fragment for a filter tree.
pub trait FilterTranslator {
    /// Native fragment type.
    type Fragment;

    /// Comparison operators this translator can emit.
    fn supports(&self, op: FilterOperator) -> bool;

    /// Fragment for one field comparison.
    fn leaf(&self, field: &str, comparison: &Comparison) -> Self::Fragment;

    fn and(&self, children: Vec<Self::Fragment>) -> Self::Fragment;

    fn or(&self, children: Vec<Self::Fragment>) -> Self::Fragment;

    fn not(&self, child: Self::Fragment) -> Self::Fragment;
}

/// Walk a filter tree and emit its native fragment.
///
/// Fails with [`StoreError::InvalidFilter`] when the translator cannot emit
/// one of the operators, so a backend never silently drops part of a filter.
pub fn translate<T: FilterTranslator>(
    expr: &FilterExpression,
    translator: &T,
) -> Result<T::Fragment, StoreError> {
    match expr {
        FilterExpression::Condition { field, comparison } => {
            let op = comparison.operator();
            if !translator.supports(op) {
                return Err(StoreError::InvalidFilter(format!(
                    "operator '{op}' is not supported natively"
                )));
            }
            Ok(translator.leaf(field, comparison))
        }
        FilterExpression::And(children) => {
            let fragments = children
                .iter()
                .map(|child| translate(child, translator))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(translator.and(fragments))
        }
        FilterExpression::Or(children) => {
            let fragments = children
                .iter()
                .map(|child| translate(child, translator))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(translator.or(fragments))
        }
        FilterExpression::Not(child) => Ok(translator.not(translate(child, translator)?)),
    }
}
