//! # dbc
//!
//! `dbc` is the module to work with .dbc files: [`parse`] builds a
//! [`Network`](types::database::Network), [`layout`] checks it and [`header`] turns it into C.

pub(crate) mod core;
pub mod header;
pub mod layout;
pub mod parse;
pub mod types;
