use std::collections::BTreeMap;

use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    database::Network,
    diagnostics::DiagnosticKind,
    errors::RecordError,
    message::MuxRole,
    names::Symbol,
    signal::{BitLayout, ByteOrder, Signal, SignalKind},
};

/// Receiver placeholder meaning "nobody".
const NO_RECEIVER: &str = "Vector__XXX";

/// Decode a `SG_` line belonging to the **current message** (the last parsed BO_).
/// Format:
/// SG_ <name> [M|mX|mXM] : <start>|<length>@<order><sign> (<factor>,<offset>) [<min>|<max>] "<unit>" <receivers...>
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("SG_")?;
    let (c, name) = c.identifier()?;

    // multiplexing tag (if present)
    let (c, mux) = if c.peek() == Some(':') {
        (c, MuxRole::None)
    } else {
        let (next, tag) = c.identifier()?;
        (next, parse_mux_tag(tag)?)
    };
    let c: Cursor<'_> = c.expect(':', "':'")?;

    // bit info: "0|16@1+"
    let (c, start_bit) = c.uint()?;
    let c: Cursor<'_> = c.expect('|', "'|'")?;
    let (c, bit_length) = c.uint()?;
    let c: Cursor<'_> = c.expect('@', "'@'")?;
    let (c, byte_order) = match c.peek() {
        Some('1') => (c.expect('1', "'1'")?, ByteOrder::LittleEndian),
        Some('0') => (c.expect('0', "'0'")?, ByteOrder::BigEndian),
        _ => {
            return Err(RecordError::Expected {
                expected: "byte order '0' or '1'",
                column: c.column(),
            });
        }
    };
    let (c, signed) = match c.peek() {
        Some('+') => (c.expect('+', "'+'")?, false),
        Some('-') => (c.expect('-', "'-'")?, true),
        _ => {
            return Err(RecordError::Expected {
                expected: "sign '+' or '-'",
                column: c.column(),
            });
        }
    };

    // "(factor,offset)"
    let c: Cursor<'_> = c.expect('(', "'('")?;
    let (c, factor) = c.float()?;
    let c: Cursor<'_> = c.expect(',', "','")?;
    let (c, offset) = c.float()?;
    let c: Cursor<'_> = c.expect(')', "')'")?;

    // "[min|max]"
    let c: Cursor<'_> = c.expect('[', "'['")?;
    let (c, min) = c.float()?;
    let c: Cursor<'_> = c.expect('|', "'|'")?;
    let (c, max) = c.float()?;
    let c: Cursor<'_> = c.expect(']', "']'")?;

    let (mut c, unit) = c.quoted()?;

    let mut receiver_names: Vec<&str> = Vec::new();
    while !c.at_end() {
        let (next, receiver) = c.identifier()?;
        if receiver != NO_RECEIVER {
            receiver_names.push(receiver);
        }
        c = next.eat(',').0;
    }

    if !(1..=64).contains(&bit_length) {
        return Err(RecordError::Invalid(format!(
            "bit length {bit_length} outside 1..=64"
        )));
    }
    if start_bit >= 64 {
        return Err(RecordError::Invalid(format!(
            "start bit {start_bit} outside 0..=63"
        )));
    }
    let bit_length: u16 = bit_length as u16;
    let mut start_bit: u16 = start_bit as u16;

    let Some(msg_key) = ctx.current_msg else {
        net.report(
            Some(ctx.line),
            DiagnosticKind::SignalWithoutMessage {
                signal: name.to_string(),
            },
        );
        return Ok(());
    };

    // Alternate Motorola numbering: the declared start bit is moved to the field's lsb.
    let reverse: bool = ctx.options.reverse_bit_order && byte_order == ByteOrder::BigEndian;
    if reverse {
        if start_bit + 1 < bit_length {
            net.report(
                Some(ctx.line),
                DiagnosticKind::ReversedBitUnderflow {
                    signal: name.to_string(),
                    start_bit,
                    bit_length,
                },
            );
            return Ok(());
        }
        start_bit -= bit_length - 1;
    }

    let receivers: Vec<Symbol> = receiver_names.iter().map(|r| net.intern(r)).collect();
    let mut signal: Signal = Signal {
        name: net.intern(name),
        message: msg_key,
        start_bit,
        bit_length,
        byte_order,
        signed,
        kind: if signed {
            SignalKind::Signed
        } else {
            SignalKind::Unsigned
        },
        factor,
        offset,
        min,
        max,
        unit,
        mux,
        receivers,
        value_table: None,
        comment: None,
        attributes: BTreeMap::new(),
        layout: BitLayout::default(),
    };
    signal.compile_layout(ctx.options.reverse_bit_order);

    ctx.echo(format_args!(
        " SG_ {name} {}: {start_bit}|{bit_length}@{}{} \"{}\"",
        mux_tag(mux),
        if byte_order == ByteOrder::LittleEndian { '1' } else { '0' },
        if signed { '-' } else { '+' },
        signal.unit,
    ));
    net.add_signal(msg_key, signal);
    Ok(())
}

/// `M` selector, `m<N>` multiplexed, `m<N>M` multiplexed selector of a nested group.
fn parse_mux_tag(tag: &str) -> Result<MuxRole, RecordError> {
    if tag == "M" {
        return Ok(MuxRole::Multiplexor);
    }
    let invalid = || RecordError::Invalid(format!("unknown multiplexer tag '{tag}'"));
    let digits: &str = tag
        .strip_prefix('m')
        .map(|t| t.strip_suffix('M').unwrap_or(t))
        .ok_or_else(invalid)?;
    digits
        .parse::<u32>()
        .map(MuxRole::Multiplexed)
        .map_err(|_| invalid())
}

fn mux_tag(mux: MuxRole) -> String {
    match mux {
        MuxRole::None => String::new(),
        MuxRole::Multiplexor => "M ".to_string(),
        MuxRole::Multiplexed(n) => format!("m{n} "),
    }
}
