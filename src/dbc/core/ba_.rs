use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    attributes::{AttributeLiteral, AttributeValue},
    database::Network,
    diagnostics::DiagnosticKind,
    errors::RecordError,
    names::Symbol,
};

/// Entity a `BA_` value is attached to.
enum Target<'a> {
    Network,
    Node(&'a str),
    Message(u64),
    Signal(u64, &'a str),
}

/// Decode an attribute value.
/// Examples:
/// - `BA_ "BusType" "CAN";`
/// - `BA_ "NmStationAddress" BU_ ECU 12;`
/// - `BA_ "GenMsgCycleTime" BO_ 100 20;`
/// - `BA_ "GenSigStartValue" SG_ 100 RPM 0;`
///
/// The literal is typed by the attribute's `BA_DEF_`. Values of undefined attributes are
/// kept with the literal's own type and reported.
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("BA_")?;
    let (c, name) = c.quoted()?;

    let (c, target) = if let Ok(c) = c.keyword("BU_") {
        let (c, node) = c.identifier()?;
        (c, Target::Node(node))
    } else if let Ok(c) = c.keyword("BO_") {
        let (c, id) = c.uint()?;
        (c, Target::Message(id))
    } else if let Ok(c) = c.keyword("SG_") {
        let (c, id) = c.uint()?;
        let (c, signal) = c.identifier()?;
        (c, Target::Signal(id, signal))
    } else if c.keyword("EV_").is_ok() {
        log::trace!("ignoring environment variable attribute value");
        return Ok(());
    } else {
        (c, Target::Network)
    };
    let (_, literal) = literal(c)?;
    ctx.echo(format_args!("BA_ \"{name}\" {literal:?}"));

    let sym: Symbol = net.intern(&name);
    let Some(value) = typed(net, ctx, sym, &name, literal) else {
        return Ok(());
    };

    let line_no: Option<usize> = Some(ctx.line);
    match target {
        Target::Network => {
            net.attributes.insert(sym, value);
        }
        Target::Node(node) => match net.node_key_by_name(node).and_then(|k| net.node_mut(k)) {
            Some(n) => {
                n.attributes.insert(sym, value);
            }
            None => net.report(
                line_no,
                DiagnosticKind::UnknownNode {
                    name: node.to_string(),
                },
            ),
        },
        Target::Message(id) => {
            let key = u32::try_from(id)
                .ok()
                .and_then(|id| net.message_key_by_id(id));
            match key.and_then(|k| net.message_mut(k)) {
                Some(m) => {
                    m.attributes.insert(sym, value);
                }
                None => net.report(
                    line_no,
                    DiagnosticKind::UnknownMessage {
                        reference: id.to_string(),
                    },
                ),
            }
        }
        Target::Signal(id, signal) => {
            let Some(message) = u32::try_from(id).ok().and_then(|id| net.message_by_id(id))
            else {
                net.report(
                    line_no,
                    DiagnosticKind::UnknownMessage {
                        reference: id.to_string(),
                    },
                );
                return Ok(());
            };
            match net
                .signal_by_name(message, signal)
                .map(|(k, _)| k)
                .and_then(|k| net.signal_mut(k))
            {
                Some(s) => {
                    s.attributes.insert(sym, value);
                }
                None => net.report(
                    line_no,
                    DiagnosticKind::UnknownSignal {
                        message: id.to_string(),
                        signal: signal.to_string(),
                    },
                ),
            }
        }
    }
    Ok(())
}

/// Value of a `BA_` / `BA_DEF_DEF_` line: a quoted string or a number.
pub(crate) fn literal(c: Cursor<'_>) -> Result<(Cursor<'_>, AttributeLiteral), RecordError> {
    if c.peek() == Some('"') {
        let (c, text) = c.quoted()?;
        Ok((c, AttributeLiteral::Text(text)))
    } else {
        let (c, n) = c.float()?;
        Ok((c, AttributeLiteral::Number(n)))
    }
}

/// Types `literal` against the definition of `sym`, reporting anything that does not fit.
pub(crate) fn typed(
    net: &mut Network,
    ctx: &ParseContext<'_>,
    sym: Symbol,
    name: &str,
    literal: AttributeLiteral,
) -> Option<AttributeValue> {
    let Some(definition) = net.attribute_definitions.get(&sym) else {
        net.report(
            Some(ctx.line),
            DiagnosticKind::UnknownAttribute {
                name: name.to_string(),
            },
        );
        return Some(literal.untyped());
    };
    match definition.typed_value(&literal) {
        Some(value) => Some(value),
        None => {
            let value: String = match &literal {
                AttributeLiteral::Number(n) => n.to_string(),
                AttributeLiteral::Text(s) => s.clone(),
            };
            net.report(
                Some(ctx.line),
                DiagnosticKind::AttributeTypeMismatch {
                    name: name.to_string(),
                    value,
                },
            );
            None
        }
    }
}
