//! Fluent per-table query builder.
//!
//! A [`QueryBuilder`] accumulates filters and pagination for one table.
//! Chain methods take `&mut self` and return `&mut Self`; terminal
//! operations read the accumulated state without clearing it.
//!
//! ```ignore
//! let mut users = client.from("users");
//! users.eq("status", "active").gt("age", 18).range(0, 9);
//! let page = users.select("id,name").await;
//!
//! // State is kept between terminals; reset before reusing for another query.
//! users.reset();
//! ```

use crate::condition::{Condition, ConditionValue, Op, Scalar};
use crate::error::{AthenaError, AthenaResult};
use crate::mutation::{Mutation, MutationQuery};
use crate::options::{CallOptions, DeleteOptions, UpsertOptions, merge_options};
use crate::payload::{AggregationStrategy, Columns, FetchPayload, TimeGranularity, snapshot_conditions};
use crate::result::QueryResult;
use crate::transport::{GatewayTransport, HttpTransport};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::sync::Arc;

/// Structured fetch/insert/update/delete builder bound to one table.
pub struct QueryBuilder<T: GatewayTransport = HttpTransport> {
    /// Target table
    table: String,
    transport: Arc<T>,
    /// Client-level default options
    defaults: Arc<CallOptions>,
    /// Accumulated filters, in insertion order
    conditions: Vec<Condition>,
    limit: Option<i64>,
    offset: Option<i64>,
    /// Fetch from a view instead of the table
    view: Option<String>,
    group_by: Option<String>,
    time_granularity: Option<TimeGranularity>,
    current_page: Option<i64>,
    page_size: Option<i64>,
    total_pages: Option<i64>,
    aggregation_column: Option<String>,
    aggregation_strategy: Option<AggregationStrategy>,
    aggregation_dedup: Option<bool>,
}

impl<T: GatewayTransport> Clone for QueryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            transport: Arc::clone(&self.transport),
            defaults: Arc::clone(&self.defaults),
            conditions: self.conditions.clone(),
            limit: self.limit,
            offset: self.offset,
            view: self.view.clone(),
            group_by: self.group_by.clone(),
            time_granularity: self.time_granularity,
            current_page: self.current_page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            aggregation_column: self.aggregation_column.clone(),
            aggregation_strategy: self.aggregation_strategy,
            aggregation_dedup: self.aggregation_dedup,
        }
    }
}

impl<T: GatewayTransport> std::fmt::Debug for QueryBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("conditions", &self.conditions)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("view", &self.view)
            .field("group_by", &self.group_by)
            .field("current_page", &self.current_page)
            .field("aggregation_column", &self.aggregation_column)
            .finish()
    }
}

impl<T: GatewayTransport + 'static> QueryBuilder<T> {
    /// Create a builder with empty state.
    pub fn new(table: impl Into<String>, transport: Arc<T>, defaults: Arc<CallOptions>) -> Self {
        Self {
            table: table.into(),
            transport,
            defaults,
            conditions: Vec::new(),
            limit: None,
            offset: None,
            view: None,
            group_by: None,
            time_granularity: None,
            current_page: None,
            page_size: None,
            total_pages: None,
            aggregation_column: None,
            aggregation_strategy: None,
            aggregation_dedup: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    // ==================== Filters ====================

    /// Append an arbitrary condition.
    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    /// Add `column = value`.
    pub fn eq(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::eq(column, value))
    }

    /// Add `column != value`.
    pub fn neq(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::neq(column, value))
    }

    /// Add `column > value`.
    pub fn gt(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::gt(column, value))
    }

    /// Add `column >= value`.
    pub fn gte(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::gte(column, value))
    }

    /// Add `column < value`.
    pub fn lt(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::lt(column, value))
    }

    /// Add `column <= value`.
    pub fn lte(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::lte(column, value))
    }

    /// Add a case-sensitive pattern match.
    pub fn like(&mut self, column: &str, pattern: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::like(column, pattern))
    }

    /// Add a case-insensitive pattern match.
    pub fn ilike(&mut self, column: &str, pattern: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::ilike(column, pattern))
    }

    /// Add an `IS` check (typically against null or a boolean).
    pub fn is(&mut self, column: &str, value: impl Into<Scalar>) -> &mut Self {
        self.filter(Condition::is(column, value))
    }

    /// Add `column IN (values)`.
    pub fn in_list<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.filter(Condition::in_list(column, values))
    }

    /// Add an array containment check.
    pub fn contains<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.filter(Condition::contains(column, values))
    }

    /// Add an array "contained by" check.
    pub fn contained_by<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.filter(Condition::contained_by(column, values))
    }

    /// Negate `column <operator> value`; sent as the expression
    /// `"column.operator.value"`.
    pub fn not(&mut self, column: &str, operator: Op, value: impl Into<ConditionValue>) -> &mut Self {
        self.filter(Condition::not(column, operator, value))
    }

    /// Negate a raw gateway expression.
    pub fn not_expr(&mut self, expression: impl Into<String>) -> &mut Self {
        self.filter(Condition::not_expr(expression))
    }

    /// Add a raw gateway OR expression, e.g. `"status.eq.active,role.eq.admin"`.
    pub fn or(&mut self, expression: impl Into<String>) -> &mut Self {
        self.filter(Condition::or(expression))
    }

    /// Add one `eq` per entry, in iteration order.
    pub fn match_all<I, K, V>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Scalar>,
    {
        for (column, value) in filters {
            self.conditions.push(Condition::eq(column, value));
        }
        self
    }

    // ==================== Pagination ====================

    /// Select the inclusive row window `[from, to]`.
    ///
    /// Sets `offset = from` and `limit = to - from + 1`; bounds are not
    /// checked.
    pub fn range(&mut self, from: i64, to: i64) -> &mut Self {
        self.offset = Some(from);
        self.limit = Some(to - from + 1);
        self
    }

    pub fn limit(&mut self, count: i64) -> &mut Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(&mut self, count: i64) -> &mut Self {
        self.offset = Some(count);
        self
    }

    // ==================== Grouping ====================

    /// Fetch from a named view.
    pub fn view(&mut self, name: impl Into<String>) -> &mut Self {
        self.view = Some(name.into());
        self
    }

    /// Group fetched rows by a column.
    pub fn group_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.group_by = Some(column.into());
        self
    }

    /// Bucket a grouped time column.
    pub fn time_granularity(&mut self, granularity: TimeGranularity) -> &mut Self {
        self.time_granularity = Some(granularity);
        self
    }

    /// Page-based pagination handled by the gateway.
    pub fn page(&mut self, current_page: i64, page_size: i64) -> &mut Self {
        self.current_page = Some(current_page);
        self.page_size = Some(page_size);
        self
    }

    pub fn total_pages(&mut self, pages: i64) -> &mut Self {
        self.total_pages = Some(pages);
        self
    }

    /// Aggregate `column` over grouped rows.
    pub fn aggregate(&mut self, column: impl Into<String>, strategy: AggregationStrategy) -> &mut Self {
        self.aggregation_column = Some(column.into());
        self.aggregation_strategy = Some(strategy);
        self
    }

    /// Deduplicate rows before aggregating.
    pub fn aggregation_dedup(&mut self, dedup: bool) -> &mut Self {
        self.aggregation_dedup = Some(dedup);
        self
    }

    /// Clear filters, pagination, grouping and aggregation.
    pub fn reset(&mut self) -> &mut Self {
        self.conditions.clear();
        self.limit = None;
        self.offset = None;
        self.view = None;
        self.group_by = None;
        self.time_granularity = None;
        self.current_page = None;
        self.page_size = None;
        self.total_pages = None;
        self.aggregation_column = None;
        self.aggregation_strategy = None;
        self.aggregation_dedup = None;
        self
    }

    // ==================== Accessors ====================

    /// Accumulated conditions, in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// Client defaults overlaid with `options`.
    pub fn merged_options(&self, options: Option<&CallOptions>) -> CallOptions {
        merge_options([Some(&*self.defaults), options])
    }

    /// The fetch body `select` would send right now.
    pub fn to_fetch_payload(&self, columns: impl Into<Columns>, options: Option<&CallOptions>) -> FetchPayload {
        let merged = self.merged_options(options);
        self.fetch_payload(columns.into(), &merged)
    }

    fn fetch_payload(&self, columns: Columns, merged: &CallOptions) -> FetchPayload {
        FetchPayload {
            view_name: self.view.clone(),
            table_name: Some(self.table.clone()),
            columns: Some(columns),
            conditions: snapshot_conditions(&self.conditions),
            limit: self.limit,
            offset: self.offset,
            strip_nulls: Some(merged.strip_nulls.unwrap_or(true)),
            current_page: self.current_page,
            page_size: self.page_size,
            total_pages: self.total_pages,
            group_by: self.group_by.clone(),
            time_granularity: self.time_granularity,
            aggregation_column: self.aggregation_column.clone(),
            aggregation_strategy: self.aggregation_strategy,
            aggregation_dedup: self.aggregation_dedup,
        }
    }

    // ==================== Fetch ====================

    /// Fetch rows matching the accumulated state.
    ///
    /// The payload is captured when this is called, so later chain calls do
    /// not affect the returned future.
    pub fn select(&self, columns: impl Into<Columns>) -> BoxFuture<'static, QueryResult> {
        self.fetch(columns.into(), None)
    }

    /// [`QueryBuilder::select`] with per-call options.
    pub fn select_with(
        &self,
        columns: impl Into<Columns>,
        options: CallOptions,
    ) -> BoxFuture<'static, QueryResult> {
        self.fetch(columns.into(), Some(options))
    }

    /// Fetch and collapse array data to its first row (`None` when empty).
    pub fn single(&self, columns: impl Into<Columns>) -> BoxFuture<'static, QueryResult> {
        self.select(columns).map(QueryResult::into_single).boxed()
    }

    /// [`QueryBuilder::single`] with per-call options.
    pub fn single_with(
        &self,
        columns: impl Into<Columns>,
        options: CallOptions,
    ) -> BoxFuture<'static, QueryResult> {
        self.select_with(columns, options)
            .map(QueryResult::into_single)
            .boxed()
    }

    /// Alias for [`QueryBuilder::single`].
    pub fn maybe_single(&self, columns: impl Into<Columns>) -> BoxFuture<'static, QueryResult> {
        self.single(columns)
    }

    /// Alias for [`QueryBuilder::single_with`].
    pub fn maybe_single_with(
        &self,
        columns: impl Into<Columns>,
        options: CallOptions,
    ) -> BoxFuture<'static, QueryResult> {
        self.single_with(columns, options)
    }

    fn fetch(&self, columns: Columns, options: Option<CallOptions>) -> BoxFuture<'static, QueryResult> {
        let merged = self.merged_options(options.as_ref());
        let payload = self.fetch_payload(columns, &merged);
        let transport = Arc::clone(&self.transport);
        async move { QueryResult::from(transport.fetch(&payload, &merged).await) }.boxed()
    }

    // ==================== Mutations ====================

    /// Insert one row (object) or many (array). Nothing is sent until the
    /// returned handle is resolved.
    pub fn insert(&self, values: impl Serialize) -> AthenaResult<MutationQuery<T>> {
        self.insert_with(values, CallOptions::default())
    }

    /// [`QueryBuilder::insert`] with per-call options.
    pub fn insert_with(&self, values: impl Serialize, options: CallOptions) -> AthenaResult<MutationQuery<T>> {
        let values = serde_json::to_value(values)?;
        Ok(self.mutation(Mutation::Insert { values }, options))
    }

    /// Insert or update on conflict.
    pub fn upsert(&self, values: impl Serialize) -> AthenaResult<MutationQuery<T>> {
        self.upsert_with(values, UpsertOptions::default())
    }

    /// [`QueryBuilder::upsert`] with conflict target, update body and options.
    pub fn upsert_with(&self, values: impl Serialize, options: UpsertOptions) -> AthenaResult<MutationQuery<T>> {
        let values = serde_json::to_value(values)?;
        let UpsertOptions {
            options,
            update_body,
            on_conflict,
        } = options;
        Ok(self.mutation(
            Mutation::Upsert {
                values,
                update_body,
                on_conflict,
            },
            options,
        ))
    }

    /// Update rows matching the current filters.
    ///
    /// Filters are snapshotted now; later chain calls do not affect the handle.
    pub fn update(&self, values: impl Serialize) -> AthenaResult<MutationQuery<T>> {
        self.update_with(values, CallOptions::default())
    }

    /// [`QueryBuilder::update`] with per-call options.
    pub fn update_with(&self, values: impl Serialize, options: CallOptions) -> AthenaResult<MutationQuery<T>> {
        let values = serde_json::to_value(values)?;
        let conditions = snapshot_conditions(&self.conditions);
        Ok(self.mutation(Mutation::Update { values, conditions }, options))
    }

    /// Delete by resource id and/or the current filters.
    pub fn delete(&self) -> AthenaResult<MutationQuery<T>> {
        self.delete_with(DeleteOptions::default())
    }

    /// [`QueryBuilder::delete`] with an explicit resource id and options.
    ///
    /// The resource id is taken from `options`, else from the first `eq` on
    /// `resource_id` or `id`. Fails without sending anything when there is
    /// neither a resource id nor a filter.
    pub fn delete_with(&self, options: DeleteOptions) -> AthenaResult<MutationQuery<T>> {
        let DeleteOptions {
            options,
            resource_id,
        } = options;
        let resource_id = resource_id
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.conditions
                    .iter()
                    .find(|c| c.targets_resource_id())
                    .and_then(Condition::resource_id)
            });

        if resource_id.is_none() && self.conditions.is_empty() {
            return Err(AthenaError::validation(
                "delete requires a resource_id either via eq(\"resource_id\", ...) or \
                 DeleteOptions::resource_id, or at least one filter",
            ));
        }

        let conditions = snapshot_conditions(&self.conditions);
        Ok(self.mutation(
            Mutation::Delete {
                resource_id,
                conditions,
            },
            options,
        ))
    }

    fn mutation(&self, mutation: Mutation, options: CallOptions) -> MutationQuery<T> {
        MutationQuery::new(
            Arc::clone(&self.transport),
            self.table.clone(),
            mutation,
            Arc::clone(&self.defaults),
            options,
        )
    }
}

#[cfg(test)]
mod tests;
