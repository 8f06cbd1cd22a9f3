//! Recoverable problems found while building a [`Network`](crate::dbc::types::database::Network).
//!
//! Nothing in here aborts a parse. Each problem is recorded with the line it came from
//! (when there is one) and the parse carries on with a best-effort model.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One reported problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based input line, `None` for model-wide checks.
    pub line: Option<usize>,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum DiagnosticKind {
    #[error("malformed {keyword} record: {reason}")]
    MalformedRecord { keyword: String, reason: String },
    #[error("signal '{signal}' appears before any BO_ record")]
    SignalWithoutMessage { signal: String },
    #[error("reference to unknown message {reference}")]
    UnknownMessage { reference: String },
    #[error("reference to unknown signal '{signal}' in message {message}")]
    UnknownSignal { message: String, signal: String },
    #[error("reference to unknown node '{name}'")]
    UnknownNode { name: String },
    #[error("attribute '{name}' has no BA_DEF_ definition")]
    UnknownAttribute { name: String },
    #[error("value '{value}' does not fit the definition of attribute '{name}'")]
    AttributeTypeMismatch { name: String, value: String },
    #[error("message id {id} redefined: '{previous}' replaced by '{replacement}'")]
    DuplicateMessageId {
        id: u32,
        previous: String,
        replacement: String,
    },
    #[error("message '{message}' transmitted by undeclared node '{node}'")]
    UndeclaredTransmitter { message: String, node: String },
    #[error("value table of '{signal}' defines code {code} twice")]
    DuplicateEnumCode { signal: String, code: i64 },
    #[error(
        "signal '{signal}' cannot be reversed: start bit {start_bit} is below its length {bit_length}"
    )]
    ReversedBitUnderflow {
        signal: String,
        start_bit: u16,
        bit_length: u16,
    },
    #[error("signal '{signal}' exceeds the {total_bits} bits of message '{message}'")]
    SignalOutOfRange {
        message: String,
        signal: String,
        total_bits: u32,
    },
    #[error("signals '{first}' and '{second}' of message '{message}' overlap")]
    OverlappingSignals {
        message: String,
        first: String,
        second: String,
    },
}
