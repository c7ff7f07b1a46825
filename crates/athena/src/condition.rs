//! Filter condition types for gateway queries.
//!
//! This module provides [`Op`] (operator), [`Scalar`], [`ConditionValue`] and
//! [`Condition`] primitives. A condition is serialized verbatim into the
//! `conditions` array of a gateway payload; array position is significant and
//! the gateway combines entries with AND.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway filter operator.
///
/// # Example
/// ```ignore
/// use athena::Op;
///
/// assert_eq!(Op::ContainedBy.as_str(), "containedBy");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Op {
    /// column = value
    Eq,
    /// column != value
    Neq,
    /// column > value
    Gt,
    /// column >= value
    Gte,
    /// column < value
    Lt,
    /// column <= value
    Lte,
    /// LIKE pattern match
    Like,
    /// Case-insensitive LIKE
    Ilike,
    /// IS (null / true / false)
    Is,
    /// column IN (list)
    In,
    /// Array/JSON column contains every listed value
    Contains,
    /// Array/JSON column is contained by the listed values
    ContainedBy,
    /// Negated raw expression (`column.op.value`)
    Not,
    /// Raw boolean OR expression
    Or,
}

impl Op {
    /// Wire name of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Like => "like",
            Op::Ilike => "ilike",
            Op::Is => "is",
            Op::In => "in",
            Op::Contains => "contains",
            Op::ContainedBy => "containedBy",
            Op::Not => "not",
            Op::Or => "or",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single JSON scalar used as a filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::UInt(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(<$conv>::from(value))
                }
            }

            impl From<$ty> for ConditionValue {
                fn from(value: $ty) -> Self {
                    ConditionValue::Scalar(Scalar::from(value))
                }
            }

            impl From<Vec<$ty>> for ConditionValue {
                fn from(values: Vec<$ty>) -> Self {
                    ConditionValue::List(values.into_iter().map(Scalar::from).collect())
                }
            }
        )*
    };
}

impl_scalar_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Text as String,
    &str => Text as String,
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Scalar::UInt(value), Scalar::Int)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::from(value as u64)
    }
}

impl From<isize> for Scalar {
    fn from(value: isize) -> Self {
        Scalar::Int(value as i64)
    }
}

macro_rules! impl_condition_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(value: $ty) -> Self {
                    ConditionValue::Scalar(Scalar::from(value))
                }
            }

            impl From<Vec<$ty>> for ConditionValue {
                fn from(values: Vec<$ty>) -> Self {
                    ConditionValue::List(values.into_iter().map(Scalar::from).collect())
                }
            }
        )*
    };
}

impl_condition_value_from!(u64, usize, isize);

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl From<Scalar> for ConditionValue {
    fn from(value: Scalar) -> Self {
        ConditionValue::Scalar(value)
    }
}

impl From<Vec<Scalar>> for ConditionValue {
    fn from(values: Vec<Scalar>) -> Self {
        ConditionValue::List(values)
    }
}

/// Value carried by a [`Condition`].
///
/// Lists serialize as JSON arrays (never a joined string); raw expressions
/// serialize as plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Expr(String),
}

impl ConditionValue {
    /// Build a list value from any iterator of scalars.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        ConditionValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Build a raw expression value.
    pub fn expr(expression: impl Into<String>) -> Self {
        ConditionValue::Expr(expression.into())
    }
}

/// Lists join with `,`; everything else uses its natural string form.
impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Scalar(s) => write!(f, "{s}"),
            ConditionValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            ConditionValue::Expr(e) => f.write_str(e),
        }
    }
}

/// One filter predicate as sent to the gateway: `{ column?, operator, value? }`.
///
/// Conditions are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column: Option<String>,
    operator: Op,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<ConditionValue>,
}

impl Condition {
    /// Create a column condition.
    pub fn new(column: impl Into<String>, operator: Op, value: impl Into<ConditionValue>) -> Self {
        Self {
            column: Some(column.into()),
            operator,
            value: Some(value.into()),
        }
    }

    fn scalar(column: impl Into<String>, operator: Op, value: impl Into<Scalar>) -> Self {
        Self::new(column, operator, ConditionValue::Scalar(value.into()))
    }

    fn list<I, V>(column: impl Into<String>, operator: Op, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::new(column, operator, ConditionValue::list(values))
    }

    // ==================== Convenience constructors ====================

    /// column = value
    pub fn eq(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Eq, value)
    }

    /// column != value
    pub fn neq(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Neq, value)
    }

    /// column > value
    pub fn gt(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Gt, value)
    }

    /// column >= value
    pub fn gte(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Gte, value)
    }

    /// column < value
    pub fn lt(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Lt, value)
    }

    /// column <= value
    pub fn lte(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Lte, value)
    }

    /// column LIKE pattern
    pub fn like(column: impl Into<String>, pattern: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Like, pattern)
    }

    /// column ILIKE pattern
    pub fn ilike(column: impl Into<String>, pattern: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Ilike, pattern)
    }

    /// column IS value
    pub fn is(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::scalar(column, Op::Is, value)
    }

    /// column IN (values...)
    pub fn in_list<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::list(column, Op::In, values)
    }

    /// column contains every value
    pub fn contains<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::list(column, Op::Contains, values)
    }

    /// column is contained by values
    pub fn contained_by<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::list(column, Op::ContainedBy, values)
    }

    /// Negation composed as a single `column.operator.value` expression.
    #[allow(clippy::should_implement_trait)]
    pub fn not(column: &str, operator: Op, value: impl Into<ConditionValue>) -> Self {
        let value = value.into();
        Self::not_expr(format!("{column}.{operator}.{value}"))
    }

    /// Negation of an already composed expression.
    pub fn not_expr(expression: impl Into<String>) -> Self {
        Self {
            column: None,
            operator: Op::Not,
            value: Some(ConditionValue::Expr(expression.into())),
        }
    }

    /// Raw gateway OR expression (passed through unvalidated).
    pub fn or(expression: impl Into<String>) -> Self {
        Self {
            column: None,
            operator: Op::Or,
            value: Some(ConditionValue::Expr(expression.into())),
        }
    }

    // ==================== Accessors ====================

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn operator(&self) -> Op {
        self.operator
    }

    pub fn value(&self) -> Option<&ConditionValue> {
        self.value.as_ref()
    }

    /// Whether this is an `eq` on `resource_id` or `id`.
    pub(crate) fn targets_resource_id(&self) -> bool {
        self.operator == Op::Eq && matches!(self.column.as_deref(), Some("resource_id" | "id"))
    }

    /// The value of an `eq` on `resource_id` or `id`, as a string.
    pub(crate) fn resource_id(&self) -> Option<String> {
        if !self.targets_resource_id() {
            return None;
        }
        match &self.value {
            None | Some(ConditionValue::Scalar(Scalar::Null)) => None,
            Some(value) => Some(value.to_string()),
        }
    }
}
