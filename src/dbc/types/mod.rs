pub mod attributes;
pub mod database;
pub mod diagnostics;
pub mod errors;
pub mod message;
pub mod names;
pub mod node;
pub mod signal;
pub mod value_table;
