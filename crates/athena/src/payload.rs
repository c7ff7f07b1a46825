//! Wire payloads sent to the gateway endpoints.
//!
//! Every optional field is omitted from the JSON body when unset.

use crate::condition::Condition;
use crate::options::CountMode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default column selection.
pub const DEFAULT_COLUMNS: &str = "*";

/// Column selection: a raw comma separated string or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    Expr(String),
    List(Vec<String>),
}

impl Columns {
    /// All columns (`*`).
    pub fn all() -> Self {
        Columns::Expr(DEFAULT_COLUMNS.to_string())
    }
}

impl Default for Columns {
    fn default() -> Self {
        Self::all()
    }
}

impl From<&str> for Columns {
    fn from(value: &str) -> Self {
        Columns::Expr(value.to_string())
    }
}

impl From<String> for Columns {
    fn from(value: String) -> Self {
        Columns::Expr(value)
    }
}

impl From<Vec<String>> for Columns {
    fn from(value: Vec<String>) -> Self {
        Columns::List(value)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(value: Vec<&str>) -> Self {
        Columns::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(value: &[&str]) -> Self {
        Columns::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(value: [&str; N]) -> Self {
        Columns::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Time bucket for grouped fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGranularity {
    Day,
    Hour,
    Minute,
}

/// Aggregation applied by the gateway over grouped fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    CumulativeSum,
}

/// Body of `POST /gateway/fetch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Columns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_nulls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_granularity: Option<TimeGranularity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_strategy: Option<AggregationStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_dedup: Option<bool>,
}

/// Body of `PUT /gateway/insert` (plain insert and upsert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertPayload {
    pub table_name: String,
    /// One row object or an array of rows.
    pub insert_body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Columns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<CountMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_to_null: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_conflict: Option<Columns>,
}

/// Body of `POST /gateway/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    pub table_name: String,
    pub update_body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Columns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_nulls: Option<bool>,
}

/// Body of `DELETE /gateway/delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Columns>,
}

/// A fully built gateway request, one variant per endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayRequest {
    Fetch(FetchPayload),
    Insert(InsertPayload),
    Update(UpdatePayload),
    Delete(DeletePayload),
}

impl GatewayRequest {
    /// JSON form of the payload (for logging and inspection).
    pub fn to_json(&self) -> Value {
        let encoded = match self {
            GatewayRequest::Fetch(p) => serde_json::to_value(p),
            GatewayRequest::Insert(p) => serde_json::to_value(p),
            GatewayRequest::Update(p) => serde_json::to_value(p),
            GatewayRequest::Delete(p) => serde_json::to_value(p),
        };
        encoded.unwrap_or(Value::Null)
    }
}

/// Snapshot a condition list, mapping an empty list to "absent".
pub(crate) fn snapshot_conditions(conditions: &[Condition]) -> Option<Vec<Condition>> {
    (!conditions.is_empty()).then(|| conditions.to_vec())
}
