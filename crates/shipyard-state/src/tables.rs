//! redb table definitions for the Shipyard state store.
//!
//! Each table uses `&str` keys (record ids) and `&[u8]` values
//! (JSON-serialized records).

use redb::TableDefinition;

/// A table of JSON-encoded records keyed by id.
pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Deployments keyed by `{deployment_id}`.
pub const DEPLOYMENTS: JsonTable = TableDefinition::new("deployments");

/// Services keyed by `{service_id}`.
pub const SERVICES: JsonTable = TableDefinition::new("services");
