//! Deferred write operations.
//!
//! Write operations on a [`crate::QueryBuilder`] do not hit the gateway
//! directly: they return a [`MutationQuery`] that captures the table, the
//! body and a snapshot of the filters, and only dispatches when first
//! resolved. Resolution is triggered by the first of `.await`, `execute`,
//! `select*`, `returning*`, `single*` or `maybe_single*`. Every later trigger
//! on the same handle (or any clone of it) shares that one in-flight request.
//!
//! ```ignore
//! let result = client
//!     .from("countries")
//!     .insert(json!({ "id": 1, "name": "Mordor" }))?
//!     .select_with("id,name", CallOptions::new().count(CountMode::Exact))
//!     .await;
//! ```

use crate::condition::Condition;
use crate::options::{CallOptions, merge_options};
use crate::payload::{Columns, DeletePayload, GatewayRequest, InsertPayload, UpdatePayload};
use crate::result::QueryResult;
use crate::transport::{GatewayTransport, HttpTransport};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use std::fmt;
use std::future::IntoFuture;
use std::sync::{Arc, Mutex, PoisonError};

/// The memoized resolution of a mutation handle.
///
/// Cloning and awaiting it never issues another request.
pub type Resolution = Shared<BoxFuture<'static, QueryResult>>;

/// Fixed inputs of a write operation, captured when the handle is created.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mutation {
    Insert {
        values: Value,
    },
    Upsert {
        values: Value,
        update_body: Option<Value>,
        on_conflict: Option<Columns>,
    },
    Update {
        values: Value,
        conditions: Option<Vec<Condition>>,
    },
    Delete {
        resource_id: Option<String>,
        conditions: Option<Vec<Condition>>,
    },
}

impl Mutation {
    /// Build the wire request for the given column selection and merged options.
    pub(crate) fn build(&self, table: &str, columns: Columns, options: &CallOptions) -> GatewayRequest {
        match self {
            Mutation::Insert { values } => GatewayRequest::Insert(insert_payload(
                table,
                values.clone(),
                columns,
                options,
            )),
            Mutation::Upsert {
                values,
                update_body,
                on_conflict,
            } => {
                let mut payload = insert_payload(table, values.clone(), columns, options);
                payload.update_body = update_body.clone();
                payload.on_conflict = on_conflict.clone();
                GatewayRequest::Insert(payload)
            }
            Mutation::Update { values, conditions } => GatewayRequest::Update(UpdatePayload {
                table_name: table.to_string(),
                update_body: values.clone(),
                conditions: conditions.clone(),
                columns: Some(columns),
                strip_nulls: Some(options.strip_nulls.unwrap_or(true)),
            }),
            Mutation::Delete {
                resource_id,
                conditions,
            } => GatewayRequest::Delete(DeletePayload {
                table_name: table.to_string(),
                resource_id: resource_id.clone(),
                conditions: conditions.clone(),
                columns: Some(columns),
            }),
        }
    }
}

fn insert_payload(table: &str, values: Value, columns: Columns, options: &CallOptions) -> InsertPayload {
    InsertPayload {
        table_name: table.to_string(),
        insert_body: values,
        update_body: None,
        columns: Some(columns),
        count: options.count,
        // Only an explicit `head: true` is forwarded.
        head: options.head.filter(|head| *head),
        default_to_null: options.default_to_null,
        on_conflict: None,
    }
}

/// Lifecycle of a [`MutationQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Nothing recorded, nothing sent.
    Unrefined,
    /// A column/option refinement is recorded; nothing sent yet.
    Refined,
    /// The request has been dispatched (or completed). Terminal.
    Resolved,
}

#[derive(Debug, Clone, Default)]
struct Refinement {
    columns: Columns,
    options: Option<CallOptions>,
}

enum Stage {
    Unrefined,
    Refined(Refinement),
    Resolved(Resolution),
}

struct Inner<T> {
    transport: Arc<T>,
    table: String,
    mutation: Mutation,
    defaults: Arc<CallOptions>,
    base_options: CallOptions,
    stage: Mutex<Stage>,
}

/// A deferred, memoized, once-refinable write operation.
///
/// Clones share state: refining or resolving one clone affects them all.
pub struct MutationQuery<T: GatewayTransport = HttpTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: GatewayTransport> Clone for MutationQuery<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: GatewayTransport> fmt::Debug for MutationQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationQuery")
            .field("table", &self.inner.table)
            .field("mutation", &self.inner.mutation)
            .field("state", &self.state())
            .finish()
    }
}

impl<T: GatewayTransport> MutationQuery<T> {
    /// Current lifecycle state.
    pub fn state(&self) -> MutationState {
        match &*self.lock_stage() {
            Stage::Unrefined => MutationState::Unrefined,
            Stage::Refined(_) => MutationState::Refined,
            Stage::Resolved(_) => MutationState::Resolved,
        }
    }

    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Record a refinement without dispatching.
    ///
    /// Ignored once the handle is resolved.
    pub fn refine(self, columns: impl Into<Columns>, options: Option<CallOptions>) -> Self {
        {
            let mut stage = self.lock_stage();
            if !matches!(*stage, Stage::Resolved(_)) {
                *stage = Stage::Refined(Refinement {
                    columns: columns.into(),
                    options,
                });
            }
        }
        self
    }

    /// The request this handle sends (or sent) with the recorded refinement.
    pub fn request(&self) -> GatewayRequest {
        let refinement = match &*self.lock_stage() {
            Stage::Refined(r) => r.clone(),
            _ => Refinement::default(),
        };
        let options = self.merged_options(refinement.options.as_ref());
        self.inner
            .mutation
            .build(&self.inner.table, refinement.columns, &options)
    }

    fn lock_stage(&self) -> std::sync::MutexGuard<'_, Stage> {
        self.inner.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn merged_options(&self, refinement: Option<&CallOptions>) -> CallOptions {
        merge_options([
            Some(&*self.inner.defaults),
            Some(&self.inner.base_options),
            refinement,
        ])
    }
}

impl<T: GatewayTransport + 'static> MutationQuery<T> {
    pub(crate) fn new(
        transport: Arc<T>,
        table: String,
        mutation: Mutation,
        defaults: Arc<CallOptions>,
        base_options: CallOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                table,
                mutation,
                defaults,
                base_options,
                stage: Mutex::new(Stage::Unrefined),
            }),
        }
    }

    // ==================== Resolution triggers ====================

    /// Resolve with whatever refinement is currently recorded.
    pub fn execute(&self) -> Resolution {
        self.trigger(None)
    }

    /// Refine the returned columns and resolve.
    pub fn select(&self, columns: impl Into<Columns>) -> Resolution {
        self.trigger(Some((columns.into(), None)))
    }

    /// Refine the returned columns and options, then resolve.
    ///
    /// `options` override the options given to the write call itself.
    pub fn select_with(&self, columns: impl Into<Columns>, options: CallOptions) -> Resolution {
        self.trigger(Some((columns.into(), Some(options))))
    }

    /// Alias for [`MutationQuery::select`].
    pub fn returning(&self, columns: impl Into<Columns>) -> Resolution {
        self.select(columns)
    }

    /// Alias for [`MutationQuery::select_with`].
    pub fn returning_with(&self, columns: impl Into<Columns>, options: CallOptions) -> Resolution {
        self.select_with(columns, options)
    }

    /// Resolve and collapse array data to its first row (`None` when empty).
    pub fn single(&self, columns: impl Into<Columns>) -> BoxFuture<'static, QueryResult> {
        collapse(self.select(columns))
    }

    /// [`MutationQuery::single`] with refinement options.
    pub fn single_with(
        &self,
        columns: impl Into<Columns>,
        options: CallOptions,
    ) -> BoxFuture<'static, QueryResult> {
        collapse(self.select_with(columns, options))
    }

    /// Alias for [`MutationQuery::single`].
    pub fn maybe_single(&self, columns: impl Into<Columns>) -> BoxFuture<'static, QueryResult> {
        self.single(columns)
    }

    /// Alias for [`MutationQuery::single_with`].
    pub fn maybe_single_with(
        &self,
        columns: impl Into<Columns>,
        options: CallOptions,
    ) -> BoxFuture<'static, QueryResult> {
        self.single_with(columns, options)
    }

    // ==================== Internals ====================

    /// Single-flight accessor: the first caller dispatches, everyone else
    /// gets the same shared future.
    fn trigger(&self, requested: Option<(Columns, Option<CallOptions>)>) -> Resolution {
        let mut stage = self.lock_stage();
        let recorded = match std::mem::replace(&mut *stage, Stage::Unrefined) {
            Stage::Resolved(resolution) => {
                *stage = Stage::Resolved(resolution.clone());
                return resolution;
            }
            Stage::Refined(refinement) => refinement,
            Stage::Unrefined => Refinement::default(),
        };

        let refinement = match requested {
            Some((columns, options)) => Refinement {
                columns,
                options: options.or(recorded.options),
            },
            None => recorded,
        };

        let options = self.merged_options(refinement.options.as_ref());
        let request = self
            .inner
            .mutation
            .build(&self.inner.table, refinement.columns, &options);
        let transport = Arc::clone(&self.inner.transport);

        let resolution = async move {
            let response = transport.send(&request, &options).await;
            QueryResult::from(response)
        }
        .boxed()
        .shared();

        *stage = Stage::Resolved(resolution.clone());
        resolution
    }
}

fn collapse(resolution: Resolution) -> BoxFuture<'static, QueryResult> {
    resolution.map(QueryResult::into_single).boxed()
}

impl<T: GatewayTransport + 'static> IntoFuture for MutationQuery<T> {
    type Output = QueryResult;
    type IntoFuture = Resolution;

    fn into_future(self) -> Self::IntoFuture {
        self.execute()
    }
}

impl<T: GatewayTransport + 'static> IntoFuture for &MutationQuery<T> {
    type Output = QueryResult;
    type IntoFuture = Resolution;

    fn into_future(self) -> Self::IntoFuture {
        self.execute()
    }
}
