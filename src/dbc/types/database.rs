//! Network model (SlotMap-backed).
//!
//! This module defines the in-memory **CAN network** built by the DBC parser.
//! Storage uses **SlotMap** arenas with **stable keys**: [`NodeKey`], [`MessageKey`], [`SignalKey`].
//! Every name is interned once; entities refer to names through [`Symbol`] handles and
//! [`Network::name`] turns a handle back into text.
//!
//! **Lookups**:
//! - messages by declared ID through an ordered index (`BTreeMap`), which also gives the
//!   ascending-ID iteration used by the header generator,
//! - messages by name, nodes by name, signals by name within a message,
//! - extended messages by J1939 PGN, used when resolving frames ([`Network::message_key_for_frame_id`]).
//!
//! Once parsing returns, the network is only read. It holds no interior mutability, so a
//! shared `&Network` can be used from several decoding threads at once.
//!

use log::{debug, warn};
use slotmap::{SlotMap, new_key_type};
use std::collections::{BTreeMap, HashMap};

use crate::codec::frame::{CAN_EFF_FLAG, CAN_EFF_MASK, CAN_SFF_MASK};
use crate::dbc::types::{
    attributes::{AttributeDefinition, AttributeValue},
    diagnostics::{Diagnostic, DiagnosticKind},
    message::{Message, MuxRole, Transmitter},
    names::{Interner, Symbol},
    node::Node,
    signal::Signal,
};
use crate::j1939;

// --- Stable keys (SlotMap) ---
new_key_type! { pub struct NodeKey; }
new_key_type! { pub struct MessageKey; }
new_key_type! { pub struct SignalKey; }

/// Transmitter names meaning "no sender".
const ANONYMOUS_TRANSMITTERS: [&str; 2] = ["Vector__XXX", "Vector_XXX"];

/// In-memory representation of a CAN network described by a DBC file.
///
/// Holds metadata (version, baud rate, comment), the arenas of nodes/messages/signals
/// (SlotMaps with stable keys), attribute definitions and the lookup indices.
/// Problems met while building it are kept in [`Network::diagnostics`].
#[derive(Default, Clone, Debug)]
pub struct Network {
    // --- General information ---
    /// `VERSION` string.
    pub version: String,
    /// Baud rate from the `BS_` line, 0 when absent.
    pub baudrate: u32,
    /// Network comment (bare `CM_`).
    pub comment: Option<String>,

    // --- Main storage (stable-key maps) ---
    pub(crate) names: Interner,
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) messages: SlotMap<MessageKey, Message>,
    pub(crate) signals: SlotMap<SignalKey, Signal>,
    pub(crate) nodes_order: Vec<NodeKey>,

    // --- Attributes ---
    pub(crate) attribute_definitions: BTreeMap<Symbol, AttributeDefinition>,
    pub(crate) attributes: BTreeMap<Symbol, AttributeValue>,

    // --- Lookups ---
    pub(crate) node_key_by_name: HashMap<Symbol, NodeKey>,
    pub(crate) msg_key_by_id: BTreeMap<u32, MessageKey>, // declared id → MessageKey
    pub(crate) msg_key_by_name: HashMap<Symbol, MessageKey>,
    pub(crate) msg_key_by_pgn: BTreeMap<u32, MessageKey>, // extended messages only

    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Network {
    // --------- Names --------
    pub(crate) fn intern(&mut self, name: &str) -> Symbol {
        self.names.intern(name)
    }

    /// Symbol of an already known name.
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.names.get(name)
    }

    /// Text of an interned name.
    pub fn name(&self, sym: Symbol) -> &str {
        self.names.resolve(sym)
    }

    // --------- Nodes --------
    /// Adds a node if not already present and returns its key.
    pub(crate) fn add_node_if_absent(&mut self, name: &str) -> NodeKey {
        let sym: Symbol = self.intern(name);
        if let Some(&key) = self.node_key_by_name.get(&sym) {
            return key;
        }
        let key: NodeKey = self.nodes.insert(Node::new(sym));
        self.nodes_order.push(key);
        self.node_key_by_name.insert(sym, key);
        key
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub(crate) fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn node_key_by_name(&self, name: &str) -> Option<NodeKey> {
        let sym: Symbol = self.symbol(name)?;
        self.node_key_by_name.get(&sym).copied()
    }

    /// Returns a `&Node` given its (case-sensitive) name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node(self.node_key_by_name(name)?)
    }

    /// Nodes in `BU_` declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &Node)> + '_ {
        self.nodes_order
            .iter()
            .filter_map(move |&k| self.nodes.get(k).map(|n| (k, n)))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ------------- Messages ------------
    /// Inserts a message, replacing (and reporting) any message already declared with `id`.
    pub(crate) fn insert_message(
        &mut self,
        id: u32,
        name: &str,
        byte_length: u8,
        transmitter: &str,
        line: Option<usize>,
    ) -> MessageKey {
        let name_sym: Symbol = self.intern(name);
        let transmitter: Transmitter = self.resolve_transmitter(name, transmitter, line);

        if let Some(old_key) = self.msg_key_by_id.get(&id).copied() {
            let previous: String = self
                .message(old_key)
                .map(|m| self.name(m.name).to_string())
                .unwrap_or_default();
            self.remove_message(old_key);
            self.report(
                line,
                DiagnosticKind::DuplicateMessageId {
                    id,
                    previous,
                    replacement: name.to_string(),
                },
            );
        }

        let message: Message = Message::new(id, name_sym, byte_length, transmitter);
        let pgn: Option<u32> = message.pgn();
        let key: MessageKey = self.messages.insert(message);
        self.msg_key_by_id.insert(id, key);
        self.msg_key_by_name.insert(name_sym, key);
        if let Some(pgn) = pgn {
            self.msg_key_by_pgn.entry(pgn).or_insert(key);
        }
        key
    }

    fn resolve_transmitter(&mut self, message: &str, node: &str, line: Option<usize>) -> Transmitter {
        if ANONYMOUS_TRANSMITTERS.contains(&node) {
            return Transmitter::Anonymous;
        }
        if let Some(key) = self.node_key_by_name(node) {
            return Transmitter::Node(key);
        }
        let sym: Symbol = self.intern(node);
        self.report(
            line,
            DiagnosticKind::UndeclaredTransmitter {
                message: message.to_string(),
                node: node.to_string(),
            },
        );
        Transmitter::Undeclared(sym)
    }

    /// Drops a message, its signals and every index entry pointing at it.
    fn remove_message(&mut self, key: MessageKey) {
        let Some(message) = self.messages.remove(key) else {
            return;
        };
        for sk in &message.signals {
            self.signals.remove(*sk);
        }
        self.msg_key_by_id.retain(|_, k| *k != key);
        self.msg_key_by_name.retain(|_, k| *k != key);
        self.msg_key_by_pgn.retain(|_, k| *k != key);
        debug!("removed message {} ({})", self.name(message.name), message.id);
    }

    pub fn message(&self, key: MessageKey) -> Option<&Message> {
        self.messages.get(key)
    }

    pub(crate) fn message_mut(&mut self, key: MessageKey) -> Option<&mut Message> {
        self.messages.get_mut(key)
    }

    /// Key of the message declared with exactly `id` (extended IDs carry `0x80000000`).
    pub fn message_key_by_id(&self, id: u32) -> Option<MessageKey> {
        self.msg_key_by_id.get(&id).copied()
    }

    pub fn message_by_id(&self, id: u32) -> Option<&Message> {
        self.message(self.message_key_by_id(id)?)
    }

    pub fn message_key_by_name(&self, name: &str) -> Option<MessageKey> {
        let sym: Symbol = self.symbol(name)?;
        self.msg_key_by_name.get(&sym).copied()
    }

    pub fn message_by_name(&self, name: &str) -> Option<&Message> {
        self.message(self.message_key_by_name(name)?)
    }

    /// Messages in ascending declared-ID order.
    pub fn messages(&self) -> impl Iterator<Item = (MessageKey, &Message)> + '_ {
        self.msg_key_by_id
            .values()
            .filter_map(move |&k| self.messages.get(k).map(|m| (k, m)))
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Resolves the message a received frame belongs to.
    ///
    /// `id` uses the SocketCAN convention: bit 31 flags a 29-bit identifier.
    /// - standard frames match on `id & 0x7FF`;
    /// - extended frames try the exact declared ID, the bare 29-bit ID, the J1939 PGN of
    ///   extended messages, and finally a message whose declared ID is the PGN itself.
    pub fn message_key_for_frame_id(&self, id: u32) -> Option<MessageKey> {
        if id & CAN_EFF_FLAG == 0 {
            return self.message_key_by_id(id & CAN_SFF_MASK);
        }
        let raw: u32 = id & CAN_EFF_MASK;
        if let Some(key) = self
            .message_key_by_id(raw | CAN_EFF_FLAG)
            .or_else(|| self.message_key_by_id(raw))
        {
            return Some(key);
        }
        let pgn: u32 = j1939::decompose(raw).pgn;
        self.msg_key_by_pgn
            .get(&pgn)
            .copied()
            .or_else(|| self.message_key_by_id(pgn))
    }

    /// [`Network::message_key_for_frame_id`] resolved to the message itself.
    pub fn message_for_frame(&self, id: u32) -> Option<&Message> {
        self.message_key_for_frame_id(id)
            .and_then(|k| self.message(k))
    }

    // ------------- Signals ------------
    /// Appends a signal to `msg_key`, keeping the message's list ordered by
    /// (start bit, multiplexor switch value). The first `M` signal becomes the selector.
    pub(crate) fn add_signal(&mut self, msg_key: MessageKey, signal: Signal) -> Option<SignalKey> {
        self.messages.get(msg_key)?;
        let order_key = (signal.start_bit, signal.mux.sort_index());
        let is_selector: bool = signal.mux == MuxRole::Multiplexor;
        let sk: SignalKey = self.signals.insert(signal);

        let signals = &self.signals;
        let message: &mut Message = self.messages.get_mut(msg_key)?;
        let pos: usize = message.signals.partition_point(|k| {
            signals
                .get(*k)
                .is_some_and(|s| (s.start_bit, s.mux.sort_index()) <= order_key)
        });
        message.signals.insert(pos, sk);
        if is_selector && message.multiplexor.is_none() {
            message.multiplexor = Some(sk);
        }
        Some(sk)
    }

    pub fn signal(&self, key: SignalKey) -> Option<&Signal> {
        self.signals.get(key)
    }

    pub(crate) fn signal_mut(&mut self, key: SignalKey) -> Option<&mut Signal> {
        self.signals.get_mut(key)
    }

    /// Signals of `message` in stored order.
    pub fn signals_of<'a>(
        &'a self,
        message: &'a Message,
    ) -> impl Iterator<Item = (SignalKey, &'a Signal)> + 'a {
        message
            .signals
            .iter()
            .filter_map(move |&k| self.signals.get(k).map(|s| (k, s)))
    }

    /// Finds a signal of `message` by (case-sensitive) name.
    pub fn signal_by_name<'a>(
        &'a self,
        message: &'a Message,
        name: &str,
    ) -> Option<(SignalKey, &'a Signal)> {
        let sym: Symbol = self.symbol(name)?;
        self.signals_of(message).find(|(_, s)| s.name == sym)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    // ------------- Attributes ------------
    pub(crate) fn define_attribute(&mut self, definition: AttributeDefinition) {
        self.attribute_definitions
            .insert(definition.name, definition);
    }

    pub(crate) fn attribute_definition_mut(&mut self, name: Symbol) -> Option<&mut AttributeDefinition> {
        self.attribute_definitions.get_mut(&name)
    }

    pub fn attribute_definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attribute_definitions.get(&self.symbol(name)?)
    }

    pub fn attribute_definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attribute_definitions.values()
    }

    /// Network-scope attribute value, falling back to the definition default.
    pub fn network_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attribute_in(&self.attributes, name)
    }

    pub fn node_attribute<'a>(&'a self, node: &'a Node, name: &str) -> Option<&'a AttributeValue> {
        self.attribute_in(&node.attributes, name)
    }

    pub fn message_attribute<'a>(
        &'a self,
        message: &'a Message,
        name: &str,
    ) -> Option<&'a AttributeValue> {
        self.attribute_in(&message.attributes, name)
    }

    pub fn signal_attribute<'a>(
        &'a self,
        signal: &'a Signal,
        name: &str,
    ) -> Option<&'a AttributeValue> {
        self.attribute_in(&signal.attributes, name)
    }

    fn attribute_in<'a>(
        &'a self,
        values: &'a BTreeMap<Symbol, AttributeValue>,
        name: &str,
    ) -> Option<&'a AttributeValue> {
        let sym: Symbol = self.symbol(name)?;
        values.get(&sym).or_else(|| {
            self.attribute_definitions
                .get(&sym)
                .and_then(|d| d.default.as_ref())
        })
    }

    // ------------- Diagnostics ------------
    /// Records a recoverable problem and logs it.
    pub(crate) fn report(&mut self, line: Option<usize>, kind: DiagnosticKind) {
        let diagnostic: Diagnostic = Diagnostic { line, kind };
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Problems found while building the network, in discovery order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbc::types::signal::{BitLayout, ByteOrder, SignalKind};

    fn signal(net: &mut Network, msg: MessageKey, name: &str, start: u16, mux: MuxRole) -> Signal {
        Signal {
            name: net.intern(name),
            message: msg,
            start_bit: start,
            bit_length: 4,
            byte_order: ByteOrder::LittleEndian,
            signed: false,
            kind: SignalKind::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 15.0,
            unit: String::new(),
            mux,
            receivers: Vec::new(),
            value_table: None,
            comment: None,
            attributes: BTreeMap::new(),
            layout: BitLayout::new(start, 4, ByteOrder::LittleEndian, false),
        }
    }

    #[test]
    fn duplicate_id_last_write_wins() {
        let mut net = Network::default();
        net.add_node_if_absent("ECU");
        let first = net.insert_message(100, "Old", 8, "ECU", Some(1));
        let s = signal(&mut net, first, "A", 0, MuxRole::None);
        net.add_signal(first, s);
        net.insert_message(100, "New", 4, "ECU", Some(3));

        assert_eq!(net.message_count(), 1);
        assert_eq!(net.signal_count(), 0);
        let m = net.message_by_id(100).unwrap();
        assert_eq!(net.name(m.name), "New");
        assert!(net.message_by_name("Old").is_none());
        assert!(matches!(
            net.diagnostics()[0].kind,
            DiagnosticKind::DuplicateMessageId { id: 100, .. }
        ));
    }

    #[test]
    fn signals_sorted_by_start_then_mux() {
        let mut net = Network::default();
        let mk = net.insert_message(1, "M", 8, "Vector__XXX", None);
        for (name, start, mux) in [
            ("C", 8, MuxRole::Multiplexed(2)),
            ("A", 0, MuxRole::Multiplexor),
            ("D", 8, MuxRole::Multiplexed(1)),
            ("B", 8, MuxRole::None),
        ] {
            let s = signal(&mut net, mk, name, start, mux);
            net.add_signal(mk, s);
        }
        let m = net.message(mk).unwrap();
        let names: Vec<&str> = net.signals_of(m).map(|(_, s)| net.name(s.name)).collect();
        assert_eq!(names, vec!["A", "B", "D", "C"]);
        assert_eq!(m.multiplexor, Some(m.signals[0]));
    }

    #[test]
    fn transmitter_resolution() {
        let mut net = Network::default();
        let ecu = net.add_node_if_absent("ECU");
        let a = net.insert_message(1, "A", 8, "ECU", None);
        let b = net.insert_message(2, "B", 8, "Vector__XXX", None);
        let c = net.insert_message(3, "C", 8, "Ghost", Some(9));
        assert_eq!(net.message(a).unwrap().transmitter, Transmitter::Node(ecu));
        assert_eq!(net.message(b).unwrap().transmitter, Transmitter::Anonymous);
        assert!(matches!(
            net.message(c).unwrap().transmitter,
            Transmitter::Undeclared(_)
        ));
        assert_eq!(net.diagnostics().len(), 1);
        assert_eq!(net.diagnostics()[0].line, Some(9));
    }

    #[test]
    fn frame_lookup_standard_and_j1939() {
        let mut net = Network::default();
        let std_key = net.insert_message(0x123, "Std", 8, "Vector__XXX", None);
        // EEC1, PGN 0xF004, declared with source address 0x00
        let eec1 = net.insert_message(0x8CF0_0400, "EEC1", 8, "Vector__XXX", None);

        assert_eq!(net.message_key_for_frame_id(0x123), Some(std_key));
        assert_eq!(net.message_key_for_frame_id(0x124), None);
        // exact match
        assert_eq!(net.message_key_for_frame_id(0x8CF0_0400), Some(eec1));
        // same PGN from another source address and priority
        assert_eq!(net.message_key_for_frame_id(0x98F0_0417), Some(eec1));
        assert_eq!(net.message_key_for_frame_id(0x98F0_0517), None);
    }

    #[test]
    fn messages_iterate_in_id_order() {
        let mut net = Network::default();
        for (id, name) in [(300, "C"), (5, "A"), (40, "B")] {
            net.insert_message(id, name, 8, "Vector__XXX", None);
        }
        let ids: Vec<u32> = net.messages().map(|(_, m)| m.id).collect();
        assert_eq!(ids, vec![5, 40, 300]);
    }

    #[test]
    fn signal_lookup_outlives_the_queried_name() {
        let mut net = Network::default();
        let mk = net.insert_message(1, "M", 8, "Vector__XXX", None);
        let s = signal(&mut net, mk, "Speed", 0, MuxRole::None);
        net.add_signal(mk, s);

        let m = net.message(mk).unwrap();
        let found: Option<(SignalKey, &Signal)> = {
            let query = String::from("Speed");
            net.signal_by_name(m, &query)
        };
        let (key, speed) = found.unwrap();
        assert_eq!(net.name(speed.name), "Speed");
        assert_eq!(m.signals, vec![key]);
        assert!(net.signal_by_name(m, "speed").is_none());
    }
}
