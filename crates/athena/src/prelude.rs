//! Convenient imports for typical `athena` usage.
//!
//! ```ignore
//! use athena::prelude::*;
//! ```

pub use crate::{
    AthenaClient, AthenaError, AthenaResult, CallOptions, Columns, Condition, CountMode,
    DeleteOptions, GatewayTransport, MutationQuery, Op, QueryBuilder, QueryResult, Scalar,
    UpsertOptions, create_client,
};
