use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    database::Network,
    diagnostics::DiagnosticKind,
    errors::RecordError,
    signal::SignalKind,
    value_table::ValueTable,
};

/// Decode a value description and attach it to its signal, which becomes enumerated.
/// Example: `VAL_ 100 Status 0 "OK" 1 "Fault" ;`
///
/// Value descriptions of environment variables (`VAL_ <name> ...`) are ignored.
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("VAL_")?;
    if !c.peek().is_some_and(|ch| ch.is_ascii_digit()) {
        log::trace!("ignoring environment variable value description");
        return Ok(());
    }
    let (c, id) = c.uint()?;
    let (mut c, signal) = c.identifier()?;

    let mut table: ValueTable = ValueTable::default();
    let mut duplicates: Vec<i64> = Vec::new();
    while !c.at_end() {
        let (next, code) = c.int()?;
        let (next, label) = next.quoted()?;
        if table.insert(code, label).is_some() {
            duplicates.push(code);
        }
        c = next;
    }
    ctx.echo(format_args!("VAL_ {id} {signal} ({} entries)", table.len()));

    let line_no: Option<usize> = Some(ctx.line);
    for code in duplicates {
        net.report(
            line_no,
            DiagnosticKind::DuplicateEnumCode {
                signal: signal.to_string(),
                code,
            },
        );
    }

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
            s.value_table = Some(table);
            s.kind = SignalKind::Enumerated;
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

#[cfg(test)]
mod tests {
    use crate::dbc::parse::from_str;
    use crate::dbc::types::diagnostics::DiagnosticKind;
    use crate::dbc::types::signal::SignalKind;

    const BASE: &str = "BO_ 100 Status_Msg: 1 Vector__XXX\n SG_ Status : 0|2@1+ (1,0) [0|3] \"\" Vector__XXX\n";

    #[test]
    fn table_attached_and_sorted() {
        let text = format!("{BASE}VAL_ 100 Status 2 \"Off\" 0 \"OK\" 1 \"Fault\" ;\n");
        let net = from_str(&text, &Default::default());
        let m = net.message_by_id(100).unwrap();
        let (_, s) = net.signal_by_name(m, "Status").unwrap();
        assert_eq!(s.kind, SignalKind::Enumerated);
        let table = s.value_table.as_ref().unwrap();
        let entries: Vec<(i64, &str)> = table.iter().collect();
        assert_eq!(entries, vec![(0, "OK"), (1, "Fault"), (2, "Off")]);
    }

    #[test]
    fn negative_codes_and_duplicates() {
        let text = format!("{BASE}VAL_ 100 Status -1 \"SNA\" 1 \"A\" 1 \"B\";\n");
        let net = from_str(&text, &Default::default());
        let m = net.message_by_id(100).unwrap();
        let (_, s) = net.signal_by_name(m, "Status").unwrap();
        let table = s.value_table.as_ref().unwrap();
        assert_eq!(table.lookup(-1), Some("SNA"));
        assert_eq!(table.lookup(1), Some("B"));
        assert!(matches!(
            net.diagnostics()[0].kind,
            DiagnosticKind::DuplicateEnumCode { code: 1, .. }
        ));
    }

    #[test]
    fn unknown_targets_never_create_entities() {
        let text = format!("{BASE}VAL_ 5 Status 0 \"x\";\nVAL_ 100 Other 0 \"x\";\n");
        let net = from_str(&text, &Default::default());
        assert_eq!(net.message_count(), 1);
        assert_eq!(net.signal_count(), 1);
        assert_eq!(net.diagnostics().len(), 2);
    }

    #[test]
    fn environment_variable_tables_are_ignored() {
        let net = from_str("VAL_ EnvMode 0 \"off\" 1 \"on\";\n", &Default::default());
        assert!(net.diagnostics().is_empty());
    }
}
