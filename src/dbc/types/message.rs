use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::frame::{CAN_EFF_FLAG, CAN_EFF_MASK, CAN_SFF_MASK};
use crate::dbc::types::{
    attributes::AttributeValue,
    database::{NodeKey, SignalKey},
    names::Symbol,
};
use crate::j1939;

/// CAN message declared by a `BO_` line.
///
/// `id` is the identifier exactly as written in the DBC: extended messages carry the
/// `0x80000000` flag on top of their 29-bit arbitration ID.
#[derive(Clone, PartialEq, Debug)]
pub struct Message {
    /// Numeric identifier as declared.
    pub id: u32,
    /// Message name.
    pub name: Symbol,
    /// Payload length in bytes (0..=8).
    pub byte_length: u8,
    /// Transmitting node.
    pub transmitter: Transmitter,
    /// Signals ordered by start bit, then by multiplexor switch value.
    pub signals: Vec<SignalKey>,
    /// Multiplexor selector signal, if any.
    pub multiplexor: Option<SignalKey>,
    /// Associated comment (`CM_ BO_`).
    pub comment: Option<String>,

    // --- Message Attribute Entry ---
    pub attributes: BTreeMap<Symbol, AttributeValue>,
}

impl Message {
    pub fn new(id: u32, name: Symbol, byte_length: u8, transmitter: Transmitter) -> Self {
        Message {
            id,
            name,
            byte_length,
            transmitter,
            signals: Vec::new(),
            multiplexor: None,
            comment: None,
            attributes: BTreeMap::new(),
        }
    }

    /// `true` when the DBC declares a 29-bit identifier.
    pub fn is_extended(&self) -> bool {
        self.id & CAN_EFF_FLAG != 0
    }

    /// Arbitration ID without the extended flag.
    pub fn raw_id(&self) -> u32 {
        if self.is_extended() {
            self.id & CAN_EFF_MASK
        } else {
            self.id & CAN_SFF_MASK
        }
    }

    /// J1939 parameter group number of an extended message.
    pub fn pgn(&self) -> Option<u32> {
        self.is_extended()
            .then(|| j1939::decompose(self.raw_id()).pgn)
    }

    /// Number of payload bits.
    pub fn payload_bits(&self) -> u32 {
        self.byte_length as u32 * 8
    }
}

/// Sender of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transmitter {
    /// Node declared on the `BU_` line.
    Node(NodeKey),
    /// `Vector__XXX` placeholder.
    Anonymous,
    /// Name that no `BU_` line declared.
    Undeclared(Symbol),
}

/// What role (if any) a signal plays in multiplexing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuxRole {
    /// Not multiplexed (always present).
    #[default]
    None,
    /// Selector (`M`): its value picks the active multiplexed group.
    Multiplexor,
    /// Present only when the selector equals the switch value (`m<N>`).
    Multiplexed(u32),
}

impl MuxRole {
    /// Secondary sort key inside a message: `-1` for unconditional signals.
    pub fn sort_index(self) -> i64 {
        match self {
            MuxRole::Multiplexed(n) => n as i64,
            _ => -1,
        }
    }

    /// Whether a signal with this role is decoded when the selector reads `selector`.
    pub fn is_active(self, selector: Option<u64>) -> bool {
        match self {
            MuxRole::Multiplexed(n) => selector == Some(n as u64),
            _ => true,
        }
    }
}
