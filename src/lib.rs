//! # dbc_tools
//!
//! Rust utilities for **DBC** network descriptions of CAN / J1939 buses.
//!
//! ## Highlights
//! - **DBC parser**: load `.dbc` files into a SlotMap-backed [`Network`]; malformed records
//!   become [`Diagnostic`]s instead of aborting the parse.
//! - **Signal codec**: [`decode_frame`] / [`decode_message`] turn payloads into physical values
//!   and value-table labels, honouring multiplexed groups; [`encode_message`] does the inverse.
//! - **Two Motorola conventions**: the standard sawtooth numbering, or the reversed numbering
//!   selected with [`ParseOptions::with_reverse_bit_order`].
//! - **C header generator**: [`generate_header`] emits enums, bit-position macros and packed
//!   bit-field structs, byte-identical for the same network.
//! - **J1939**: [`j1939::decompose`] / [`j1939::compose`] and PGN-aware frame lookup.
//!
//! ```
//! use dbc_tools::{ParseOptions, decode_frame, dbc, CanFrame};
//!
//! let net = dbc::parse::from_str(
//!     "BO_ 100 EngineData: 8 Vector__XXX\n SG_ RPM : 0|16@1+ (0.25,0) [0|16383.75] \"rpm\" Vector__XXX\n",
//!     &ParseOptions::default(),
//! );
//! let frame: CanFrame = "064#1027".parse().unwrap();
//! let decoded = decode_frame(&net, &frame).unwrap();
//! assert_eq!(decoded.signals[0].to_string(), "RPM = 2500 rpm");
//! ```

#[cfg(feature = "dbc")]
pub mod codec;
pub mod config;
#[cfg(feature = "dbc")]
pub mod dbc;
pub mod j1939;

// Top-level re-exports (appear under Crate Items → Structs)
#[cfg(feature = "dbc")]
#[doc(inline)]
pub use crate::codec::{
    decode::{DecodedMessage, DecodedSignal, SignalValue, decode_frame, decode_message},
    encode::{ClampReport, EncodedValue, encode_label, encode_message, encode_signal},
    frame::CanFrame,
};
#[doc(inline)]
pub use crate::config::ParseOptions;
#[cfg(feature = "dbc")]
#[doc(inline)]
pub use crate::dbc::header::{generate_header, save_header_to_file};
#[cfg(feature = "dbc")]
#[doc(inline)]
pub use crate::dbc::types::{
    attributes::{AttributeDefinition, AttributeKind, AttributeScope, AttributeValue},
    database::{MessageKey, Network, NodeKey, SignalKey},
    diagnostics::{Diagnostic, DiagnosticKind},
    errors::{DbcParseError, EncodeError, FrameParseError, HeaderError},
    message::{Message, MuxRole, Transmitter},
    names::Symbol,
    node::Node,
    signal::{ByteOrder, Signal, SignalKind},
    value_table::ValueTable,
};
#[doc(inline)]
pub use crate::j1939::{Destination, J1939Id};
