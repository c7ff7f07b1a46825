//! Call options and the layer merge policy.
//!
//! Options come in three layers, merged in this order (later wins):
//!
//! 1. client-level defaults (from [`crate::create_client`])
//! 2. per-operation options (`insert(.., opts)`, `update(.., opts)`, ...)
//! 3. per-refinement options (`.select_with(.., opts)` on a mutation handle)
//!
//! The merge is shallow: every field set in a later layer replaces the same
//! field of an earlier one. `headers` is the exception and is merged key by key.

use crate::payload::Columns;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Row-count strategy requested from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    Exact,
    Planned,
    Estimated,
}

/// Identity, auth and behavior options for one gateway call.
///
/// Every field is optional; unset fields fall through to earlier layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Gateway base URL (e.g. `https://athena-db.com`).
    pub base_url: Option<String>,
    /// Value of the `X-Athena-Client` header.
    pub client: Option<String>,
    pub api_key: Option<String>,
    /// Ask the gateway to drop null fields from returned rows.
    pub strip_nulls: Option<bool>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    /// Event name forwarded as `X-Publish-Event`.
    pub publish_event: Option<String>,
    /// Extra request headers, merged key by key across layers.
    pub headers: BTreeMap<String, String>,
    pub user_id: Option<String>,
    pub company_id: Option<String>,
    pub organization_id: Option<String>,
    pub count: Option<CountMode>,
    pub head: Option<bool>,
    pub default_to_null: Option<bool>,
}

macro_rules! string_setters {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

impl CallOptions {
    /// Create an empty option layer.
    pub fn new() -> Self {
        Self::default()
    }

    string_setters! {
        /// Set the gateway base URL.
        base_url,
        /// Set the `X-Athena-Client` value.
        client,
        /// Set the API key (`apikey` / `x-api-key`).
        api_key,
        supabase_url,
        supabase_key,
        /// Set the `X-Publish-Event` value.
        publish_event,
        /// Set the `X-User-Id` value.
        user_id,
        /// Set the `X-Company-Id` value.
        company_id,
        /// Set the `X-Organization-Id` value.
        organization_id,
    }

    /// Ask the gateway to strip (or keep) null fields.
    pub fn strip_nulls(mut self, strip: bool) -> Self {
        self.strip_nulls = Some(strip);
        self
    }

    /// Add one extra request header. Names are stored lowercase.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Request a row count.
    pub fn count(mut self, mode: CountMode) -> Self {
        self.count = Some(mode);
        self
    }

    /// Request a head-only response.
    pub fn head(mut self, head: bool) -> Self {
        self.head = Some(head);
        self
    }

    /// Fill missing insert columns with NULL instead of their defaults.
    pub fn default_to_null(mut self, enabled: bool) -> Self {
        self.default_to_null = Some(enabled);
        self
    }

    /// Overlay `later` on top of `self` (later wins, headers merge per key).
    pub fn merge(&self, later: &CallOptions) -> CallOptions {
        fn pick<T: Clone>(base: &Option<T>, later: &Option<T>) -> Option<T> {
            later.clone().or_else(|| base.clone())
        }

        let headers = self
            .headers
            .iter()
            .chain(&later.headers)
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect();

        CallOptions {
            base_url: pick(&self.base_url, &later.base_url),
            client: pick(&self.client, &later.client),
            api_key: pick(&self.api_key, &later.api_key),
            strip_nulls: pick(&self.strip_nulls, &later.strip_nulls),
            supabase_url: pick(&self.supabase_url, &later.supabase_url),
            supabase_key: pick(&self.supabase_key, &later.supabase_key),
            publish_event: pick(&self.publish_event, &later.publish_event),
            headers,
            user_id: pick(&self.user_id, &later.user_id),
            company_id: pick(&self.company_id, &later.company_id),
            organization_id: pick(&self.organization_id, &later.organization_id),
            count: pick(&self.count, &later.count),
            head: pick(&self.head, &later.head),
            default_to_null: pick(&self.default_to_null, &later.default_to_null),
        }
    }
}

/// Merge option layers from lowest to highest precedence.
///
/// Missing layers are skipped; merging nothing yields empty options.
pub fn merge_options<'a, I>(layers: I) -> CallOptions
where
    I: IntoIterator<Item = Option<&'a CallOptions>>,
{
    layers
        .into_iter()
        .flatten()
        .fold(CallOptions::default(), |acc, layer| acc.merge(layer))
}

/// Options for [`crate::QueryBuilder::upsert`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertOptions {
    pub options: CallOptions,
    /// Body applied when the inserted row conflicts.
    pub update_body: Option<Value>,
    /// Conflict target column(s).
    pub on_conflict: Option<Columns>,
}

impl UpsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn update_body(mut self, body: Value) -> Self {
        self.update_body = Some(body);
        self
    }

    pub fn on_conflict(mut self, target: impl Into<Columns>) -> Self {
        self.on_conflict = Some(target.into());
        self
    }
}

impl From<CallOptions> for UpsertOptions {
    fn from(options: CallOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// Options for [`crate::QueryBuilder::delete`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOptions {
    pub options: CallOptions,
    /// Explicit identifier of the row to delete.
    pub resource_id: Option<String>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }
}

impl From<CallOptions> for DeleteOptions {
    fn from(options: CallOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}
