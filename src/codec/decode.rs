//! Frame decoding: payload bytes to physical values.

use std::fmt;

use crate::codec::frame::CanFrame;
use crate::codec::register::PayloadRegister;
use crate::dbc::core::strings::format_f64;
use crate::dbc::types::{
    database::{Network, SignalKey},
    message::Message,
    signal::{Signal, SignalKind},
};

/// Interpreted value of one signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SignalValue<'a> {
    /// `raw * factor + offset`.
    Physical(f64),
    /// Value-table lookup; `label` is `None` when the code has no entry.
    Enum { code: i128, label: Option<&'a str> },
}

/// One signal of a decoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSignal<'a> {
    pub key: SignalKey,
    pub signal: &'a Signal,
    pub name: &'a str,
    /// Raw field, sign-extended for signed signals.
    pub raw: i128,
    pub value: SignalValue<'a>,
}

impl DecodedSignal<'_> {
    /// Physical value, or the raw code of an enumerated signal.
    pub fn as_f64(&self) -> f64 {
        match self.value {
            SignalValue::Physical(v) => v,
            SignalValue::Enum { code, .. } => code as f64,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self.value {
            SignalValue::Enum { label, .. } => label,
            SignalValue::Physical(_) => None,
        }
    }
}

impl fmt::Display for DecodedSignal<'_> {
    /// `<name> = <value>[ <unit>][ -- <comment>]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = ", self.name)?;
        match self.value {
            SignalValue::Physical(v) => write!(f, "{}", format_f64(v))?,
            SignalValue::Enum { code, label } => {
                write!(f, "{}({code})", label.unwrap_or("no match"))?
            }
        }
        if !self.signal.unit.is_empty() {
            write!(f, " {}", self.signal.unit)?;
        }
        if let Some(comment) = &self.signal.comment {
            write!(f, " -- {comment}")?;
        }
        Ok(())
    }
}

/// All signals of one frame that are active under the frame's multiplexor value.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedMessage<'a> {
    pub message: &'a Message,
    pub name: &'a str,
    /// Selector value, when the message is multiplexed.
    pub multiplexor: Option<u64>,
    /// Decoded signals in stored (start bit) order.
    pub signals: Vec<DecodedSignal<'a>>,
}

impl<'a> DecodedMessage<'a> {
    pub fn signal(&self, name: &str) -> Option<&DecodedSignal<'a>> {
        self.signals.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for DecodedMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(m) = self.multiplexor {
            writeln!(f, "Multiplexed PDU idx={m}:")?;
        }
        for s in &self.signals {
            writeln!(f, "{s}")?;
        }
        Ok(())
    }
}

/// Decodes one signal from a register.
pub fn decode_signal<'a>(
    net: &'a Network,
    key: SignalKey,
    signal: &'a Signal,
    reg: &PayloadRegister,
) -> DecodedSignal<'a> {
    let raw: i128 = signal.extract_raw(reg);
    let value: SignalValue<'a> = match signal.kind {
        SignalKind::Enumerated => SignalValue::Enum {
            code: raw,
            // codes above i64::MAX cannot be in a value table
            label: i64::try_from(raw)
                .ok()
                .and_then(|code| signal.value_table.as_ref()?.lookup(code)),
        },
        SignalKind::Unsigned | SignalKind::Signed | SignalKind::Float => {
            SignalValue::Physical(signal.to_physical(raw))
        }
    };
    DecodedSignal {
        key,
        signal,
        name: net.name(signal.name),
        raw,
        value,
    }
}

/// Decodes `payload` as an instance of `message`.
///
/// Never reads past `min(payload.len(), message.byte_length)` bytes. The selector is read
/// first; multiplexed signals whose switch value differs from it are left out.
pub fn decode_message<'a>(
    net: &'a Network,
    message: &'a Message,
    payload: &[u8],
) -> DecodedMessage<'a> {
    let reg: PayloadRegister = PayloadRegister::new(payload, message.byte_length);
    let multiplexor: Option<u64> = message
        .multiplexor
        .and_then(|k| net.signal(k))
        .map(|s| s.extract_raw_u64(&reg));

    let signals: Vec<DecodedSignal<'a>> = net
        .signals_of(message)
        .filter(|(_, s)| s.mux.is_active(multiplexor))
        .map(|(k, s)| decode_signal(net, k, s, &reg))
        .collect();

    DecodedMessage {
        message,
        name: net.name(message.name),
        multiplexor,
        signals,
    }
}

/// Resolves the frame's message and decodes it; `None` when no message matches the identifier.
pub fn decode_frame<'a>(net: &'a Network, frame: &CanFrame) -> Option<DecodedMessage<'a>> {
    let key = net.message_key_for_frame_id(frame.id())?;
    let message: &Message = net.message(key)?;
    Some(decode_message(net, message, frame.data()))
}
