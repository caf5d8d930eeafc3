//! Catalog fixtures shared by unit tests.

use serde_json::json;

use crate::database::{catalog::CatalogDefinition, CatalogSnapshot};

fn load(value: serde_json::Value) -> CatalogSnapshot {
    let def: CatalogDefinition = serde_json::from_value(value).unwrap();
    CatalogSnapshot::try_from_definition(def).unwrap()
}

fn mysql_tables() -> serde_json::Value {
    json!([
        {
            "name": "t_order",
            "columns": [
                {"name": "order_id", "data_type": "bigint"},
                {"name": "user_id", "data_type": "int"},
                {"name": "status", "data_type": "varchar"}
            ],
            "indexes": ["idx_user_id"]
        },
        {
            "name": "t_order_item",
            "columns": [
                {"name": "item_id", "data_type": "bigint"},
                {"name": "order_id", "data_type": "bigint"},
                {"name": "user_id", "data_type": "int"},
                {"name": "price", "data_type": "decimal"}
            ]
        },
        {
            "name": "t_user",
            "columns": [
                {"name": "user_id", "data_type": "int"},
                {"name": "name", "data_type": "varchar"},
                {"name": "pwd", "data_type": "varchar", "visible": false}
            ]
        },
        {
            "name": "v_order",
            "kind": "view",
            "columns": [
                {"name": "order_id", "data_type": "bigint"},
                {"name": "user_id", "data_type": "int"}
            ]
        }
    ])
}

/// MySQL catalog with session database `sharding_db`.
pub fn mysql_catalog() -> CatalogSnapshot {
    load(json!({
        "dialect": "mysql",
        "current_database": "sharding_db",
        "databases": [{"name": "sharding_db", "tables": mysql_tables()}]
    }))
}

pub fn mysql_catalog_without_session_database() -> CatalogSnapshot {
    load(json!({
        "dialect": "mysql",
        "databases": [{"name": "sharding_db", "tables": mysql_tables()}]
    }))
}

/// PostgreSQL catalog with session database `foo_db`.
pub fn pg_catalog() -> CatalogSnapshot {
    load(json!({
        "dialect": "postgresql",
        "current_database": "foo_db",
        "databases": [{
            "name": "foo_db",
            "schemas": [
                {
                    "name": "public",
                    "tables": [
                        {
                            "name": "orders",
                            "columns": [
                                {"name": "id", "data_type": "int8"},
                                {"name": "customer_id", "data_type": "int8"},
                                {"name": "price", "data_type": "numeric"}
                            ],
                            "indexes": ["orders_customer_idx"]
                        },
                        {
                            "name": "customers",
                            "columns": [
                                {"name": "id", "data_type": "int8"},
                                {"name": "name", "data_type": "text"}
                            ]
                        },
                        {
                            "name": "t1",
                            "columns": [
                                {"name": "a", "data_type": "int4"},
                                {"name": "b", "data_type": "text"}
                            ]
                        },
                        {
                            "name": "v1",
                            "kind": "view",
                            "columns": [{"name": "a", "data_type": "int4"}]
                        }
                    ]
                },
                {
                    "name": "pg_catalog",
                    "tables": [{
                        "name": "pg_class",
                        "columns": [
                            {"name": "oid", "data_type": "oid"},
                            {"name": "relname", "data_type": "name"}
                        ]
                    }]
                }
            ]
        }]
    }))
}
