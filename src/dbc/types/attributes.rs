use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dbc::types::names::Symbol;

/// Attribute definition from a `BA_DEF_` line, completed by `BA_DEF_DEF_`.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDefinition {
    /// Attribute name.
    pub name: Symbol,
    /// Entity kind the attribute applies to.
    pub scope: AttributeScope,
    /// Declared value domain.
    pub kind: AttributeKind,
    /// Default value (from `BA_DEF_DEF_`), already typed by `kind`.
    pub default: Option<AttributeValue>,
}

impl AttributeDefinition {
    /// Types a literal read from a `BA_` or `BA_DEF_DEF_` line according to this definition.
    ///
    /// Enumerations accept either the choice label or its zero-based index.
    /// Returns `None` when the literal does not belong to the domain.
    pub fn typed_value(&self, literal: &AttributeLiteral) -> Option<AttributeValue> {
        match (&self.kind, literal) {
            (AttributeKind::Int { .. } | AttributeKind::Hex { .. }, AttributeLiteral::Number(n)) => {
                if n.fract() == 0.0 {
                    Some(AttributeValue::Int(*n as i64))
                } else {
                    None
                }
            }
            (AttributeKind::Float { .. }, AttributeLiteral::Number(n)) => {
                Some(AttributeValue::Float(*n))
            }
            (AttributeKind::String, AttributeLiteral::Text(s)) => {
                Some(AttributeValue::Str(s.clone()))
            }
            (AttributeKind::Enum(choices), AttributeLiteral::Text(s)) => choices
                .iter()
                .any(|c| c == s)
                .then(|| AttributeValue::Enum(s.clone())),
            (AttributeKind::Enum(choices), AttributeLiteral::Number(n)) => {
                let idx: usize = usize::try_from(*n as i64).ok()?;
                choices.get(idx).cloned().map(AttributeValue::Enum)
            }
            _ => None,
        }
    }
}

/// Entity kind targeted by an attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeScope {
    #[default]
    Network,
    Node,
    Message,
    Signal,
}

impl fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeScope::Network => "network",
            AttributeScope::Node => "node",
            AttributeScope::Message => "message",
            AttributeScope::Signal => "signal",
        })
    }
}

/// Value domain declared by `BA_DEF_`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Int { min: i64, max: i64 },
    Hex { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    String,
    Enum(Vec<String>),
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Int { min, max } => write!(f, "INT {min} {max}"),
            AttributeKind::Hex { min, max } => write!(f, "HEX {min} {max}"),
            AttributeKind::Float { min, max } => write!(f, "FLOAT {min} {max}"),
            AttributeKind::String => f.write_str("STRING"),
            AttributeKind::Enum(choices) => write!(f, "ENUM {}", choices.join(",")),
        }
    }
}

/// Concrete attribute value stored on the network, a node, a message or a signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Str(String),
    Enum(String),
}

impl AttributeValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            AttributeValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) | AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Str(s) | AttributeValue::Enum(s) => write!(f, "{s}"),
        }
    }
}

/// Untyped value as it appears on a `BA_` line, before the definition is consulted.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeLiteral {
    Number(f64),
    Text(String),
}

impl AttributeLiteral {
    /// Best-effort typing used when no definition exists for the attribute.
    pub fn untyped(self) -> AttributeValue {
        match self {
            AttributeLiteral::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                AttributeValue::Int(n as i64)
            }
            AttributeLiteral::Number(n) => AttributeValue::Float(n),
            AttributeLiteral::Text(s) => AttributeValue::Str(s),
        }
    }
}
