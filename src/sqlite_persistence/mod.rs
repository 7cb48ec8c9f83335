mod versioned_schema;

pub use versioned_schema::{
    open_versioned, prepare_schema, Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
