use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    database::Network, diagnostics::DiagnosticKind, errors::RecordError, signal::SignalKind,
};

/// Decode a signal value type line; `1` (single) and `2` (double) mark the signal real.
/// Example: `SIG_VALTYPE_ 100 Torque : 1;`
///
/// Real signals keep being decoded as scaled integers; enumerated signals stay enumerated.
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("SIG_VALTYPE_")?;
    let (c, id) = c.uint()?;
    let (c, signal) = c.identifier()?;
    let (c, _) = c.eat(':');
    let (_, value_type) = c.uint()?;
    ctx.echo(format_args!("SIG_VALTYPE_ {id} {signal} : {value_type}"));

    let line_no: Option<usize> = Some(ctx.line);
    let Some(message) = u32::try_from(id).ok().and_then(|id| net.message_by_id(id)) else {
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
            if matches!(value_type, 1 | 2) && s.kind != SignalKind::Enumerated {
                s.kind = SignalKind::Float;
            }
        }
        None => net.report(
            line_no,
            DiagnosticKind::UnknownSignal {
                message: id.to_string(),
                signal: signal.to_string(),
            },
        ),
    }
    Ok(())
}
