//! One decoder per DBC record keyword, plus the shared lexical helpers.

pub(crate) mod cursor;
pub(crate) mod strings;

pub(crate) mod ba_;
pub(crate) mod ba_def_;
pub(crate) mod ba_def_def_;
pub(crate) mod bo_;
pub(crate) mod bs_;
pub(crate) mod bu_;
pub(crate) mod cm_;
pub(crate) mod sg_;
pub(crate) mod sig_valtype_;
pub(crate) mod val_;
pub(crate) mod version;
