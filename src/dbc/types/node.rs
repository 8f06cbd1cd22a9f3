use crate::dbc::types::{attributes::AttributeValue, names::Symbol};
use std::collections::BTreeMap;

/// Node/ECU declared on the `BU_` line.
#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    /// Node name.
    pub name: Symbol,
    /// Associated comment (`CM_ BU_`).
    pub comment: Option<String>,

    // --- Attributes ---
    pub attributes: BTreeMap<Symbol, AttributeValue>,
}

impl Node {
    pub fn new(name: Symbol) -> Self {
        Node {
            name,
            comment: None,
            attributes: BTreeMap::new(),
        }
    }
}
