mod schema;

pub use schema::{Column, SqlType, Table};
