//! # ovsdb-client
//!
//! A typed conditional API over an OVSDB row cache. Callers describe rows
//! with their own structs (bound to tables through the [`model!`] macro), and
//! the layer either answers read queries from the in-memory cache or
//! synthesizes the wire operations a transport component will submit.
//!
//! ```
//! use std::sync::Arc;
//! use ovsdb_client::{Api, TableCache};
//!
//! ovsdb_client::model! {
//!     pub struct Bridge : "Bridge" {
//!         "_uuid" => uuid: String,
//!         "name" => name: String,
//!     }
//! }
//!
//! let schema = Arc::new(
//!     serde_json::from_value(serde_json::json!({
//!         "name": "Open_vSwitch",
//!         "tables": {
//!             "Bridge": {
//!                 "columns": {"name": {"type": "string"}},
//!                 "indexes": [["name"]]
//!             }
//!         }
//!     }))
//!     .unwrap(),
//! );
//! let cache = TableCache::new(schema);
//! let api = Api::new(&cache);
//!
//! let ops = api
//!     .create(&[Bridge { uuid: "b1".into(), name: "br0".into() }])
//!     .unwrap();
//! assert_eq!(ops.len(), 1);
//! assert_eq!(ops[0].uuid_name.as_deref(), Some("b1"));
//! ```

pub mod api;
pub mod cache;
pub mod condition;
pub mod error;
pub mod mapper;
pub mod model;

pub use api::{Api, ConditionalApi, FieldMutation};
pub use cache::{RowCache, TableCache};
pub use condition::{ConditionFactory, FieldCondition};
pub use error::{ConditionError, Error, MapperError, Result};
pub use mapper::Info;
pub use model::{FieldBinding, FieldRef, FieldValue, Model, ScalarValue, field_ref};

pub use ovsdb_proto as proto;

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the unit tests: the two-table schema and models
    //! used throughout.

    use std::collections::HashMap;
    use std::sync::Arc;

    use ovsdb_proto::{DatabaseSchema, UUID_COLUMN};

    use crate::cache::TableCache;
    use crate::mapper::Info;
    use crate::model::Model;

    pub const A_UUID0: &str = "2f77b348-9768-4866-b761-89d5177ecda0";
    pub const A_UUID1: &str = "59650185-75de-4ccc-8552-1befe1dcf392";
    pub const A_UUID2: &str = "0f2b5a2f-0e14-4801-99eb-9e1dc0f40f2c";
    pub const A_UUID3: &str = "c5c29bd4-13e5-4260-b2bb-f1223e4dbc26";

    crate::model! {
        pub struct LogicalSwitch : "Logical_Switch" {
            "_uuid" => uuid: String,
            "name" => name: String,
            "ports" => ports: Vec<String>,
            "external_ids" => external_ids: HashMap<String, String>,
        }
    }

    crate::model! {
        pub struct LogicalSwitchPort : "Logical_Switch_Port" {
            "_uuid" => uuid: String,
            "name" => name: String,
            "type" => ty: String,
            "tag" => tag: Vec<i64>,
            "enabled" => enabled: Vec<bool>,
            "external_ids" => external_ids: HashMap<String, String>,
        }
    }

    pub fn test_schema() -> Arc<DatabaseSchema> {
        Arc::new(
            serde_json::from_value(serde_json::json!({
                "name": "OVN_Northbound",
                "version": "5.16.0",
                "tables": {
                    "Logical_Switch": {
                        "columns": {
                            "name": {"type": "string"},
                            "ports": {"type": {
                                "key": {"type": "uuid", "refTable": "Logical_Switch_Port"},
                                "min": 0,
                                "max": "unlimited"
                            }},
                            "external_ids": {"type": {
                                "key": "string", "value": "string", "min": 0, "max": "unlimited"
                            }}
                        },
                        "indexes": [["name"]]
                    },
                    "Logical_Switch_Port": {
                        "columns": {
                            "name": {"type": "string"},
                            "type": {"type": "string"},
                            "tag": {"type": {"key": "integer", "min": 0, "max": 1}},
                            "enabled": {"type": {"key": "boolean", "min": 0, "max": 1}},
                            "external_ids": {"type": {
                                "key": "string", "value": "string", "min": 0, "max": "unlimited"
                            }}
                        },
                        "indexes": [["name"]]
                    }
                }
            }))
            .expect("test schema must parse"),
        )
    }

    pub fn empty_cache() -> TableCache {
        TableCache::new(test_schema())
    }

    /// Insert a model into the cache the way the monitor would: a full wire
    /// row keyed by the model's uuid.
    pub fn put<M: Model>(cache: &TableCache, model: &M) {
        let info = Info::<M>::new(cache.schema()).expect("fixture model must map");
        let row = info.full_row(model).expect("fixture row must encode");
        let uuid = info
            .field_by_column(model, UUID_COLUMN)
            .expect("fixture model must carry a uuid");
        cache
            .insert_row(
                M::table_name(),
                uuid.as_string().expect("uuid must be a string"),
                row,
            )
            .expect("fixture table must exist");
    }

    pub fn lsp_cache(ports: &[LogicalSwitchPort]) -> TableCache {
        let cache = empty_cache();
        for port in ports {
            put(&cache, port);
        }
        cache
    }
}
