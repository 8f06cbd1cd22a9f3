use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    database::{MessageKey, Network},
    diagnostics::DiagnosticKind,
    errors::RecordError,
};

/// Decode a comment record. Expected formats:
/// - `CM_ "Comment regarding the network";`
/// - `CM_ BU_ <node> "text";`
/// - `CM_ BO_ <id|name> "text";`
/// - `CM_ SG_ <id> <signal> "text";`
///
/// Other targets (`EV_`) are ignored. A second comment on the same target replaces the first.
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("CM_")?;

    if c.peek() == Some('"') {
        let (_, text) = c.quoted()?;
        ctx.echo(format_args!("CM_ \"{text}\""));
        net.comment = Some(text);
        return Ok(());
    }

    if let Ok(c) = c.keyword("BU_") {
        let (c, node) = c.identifier()?;
        let (_, text) = c.quoted()?;
        ctx.echo(format_args!("CM_ BU_ {node} \"{text}\""));
        match net.node_key_by_name(node).and_then(|k| net.node_mut(k)) {
            Some(n) => n.comment = Some(text),
            None => net.report(
                Some(ctx.line),
                DiagnosticKind::UnknownNode {
                    name: node.to_string(),
                },
            ),
        }
        return Ok(());
    }

    if let Ok(c) = c.keyword("BO_") {
        // some writers reference the message by name instead of id
        let (c, msg_key, reference) = if c.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            let (c, id) = c.uint()?;
            let key: Option<MessageKey> = u32::try_from(id)
                .ok()
                .and_then(|id| net.message_key_by_id(id));
            (c, key, id.to_string())
        } else {
            let (c, name) = c.identifier()?;
            (c, net.message_key_by_name(name), name.to_string())
        };
        let (_, text) = c.quoted()?;
        ctx.echo(format_args!("CM_ BO_ {reference} \"{text}\""));
        match msg_key.and_then(|k| net.message_mut(k)) {
            Some(m) => m.comment = Some(text),
            None => net.report(Some(ctx.line), DiagnosticKind::UnknownMessage { reference }),
        }
        return Ok(());
    }

    if let Ok(c) = c.keyword("SG_") {
        let (c, id) = c.uint()?;
        let (c, signal) = c.identifier()?;
        let (_, text) = c.quoted()?;
        ctx.echo(format_args!("CM_ SG_ {id} {signal} \"{text}\""));
        let Some(message) = u32::try_from(id).ok().and_then(|id| net.message_by_id(id)) else {
            net.report(
                Some(ctx.line),
                DiagnosticKind::UnknownMessage {
                    reference: id.to_string(),
                },
            );
            return Ok(());
        };
        match net.signal_by_name(message, signal).map(|(k, _)| k) {
            Some(sk) => {
                if let Some(s) = net.signal_mut(sk) {
                    s.comment = Some(text);
                }
            }
            None => net.report(
                Some(ctx.line),
                DiagnosticKind::UnknownSignal {
                    message: id.to_string(),
                    signal: signal.to_string(),
                },
            ),
        }
        return Ok(());
    }

    log::trace!("ignoring comment target: {}", c.rest());
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::dbc::parse::from_str;
    use crate::dbc::types::diagnostics::DiagnosticKind;

    const BASE: &str = "BU_: ECU\nBO_ 100 EngineData: 8 ECU\n SG_ RPM : 0|16@1+ (0.25,0) [0|16383.75] \"rpm\" ECU\n";

    #[test]
    fn comments_on_every_target() {
        let text = format!(
            "{BASE}CM_ \"network\";\nCM_ BU_ ECU \"engine box\";\nCM_ BO_ 100 \"engine frame\";\nCM_ SG_ 100 RPM \"crank speed\";\n"
        );
        let net = from_str(&text, &Default::default());
        assert_eq!(net.comment.as_deref(), Some("network"));
        assert_eq!(
            net.node_by_name("ECU").unwrap().comment.as_deref(),
            Some("engine box")
        );
        let m = net.message_by_id(100).unwrap();
        assert_eq!(m.comment.as_deref(), Some("engine frame"));
        let (_, s) = net.signal_by_name(m, "RPM").unwrap();
        assert_eq!(s.comment.as_deref(), Some("crank speed"));
        assert!(net.diagnostics().is_empty());
    }

    #[test]
    fn message_comment_by_name_and_last_write_wins() {
        let text = format!("{BASE}CM_ BO_ EngineData \"first\";\nCM_ BO_ 100 \"second\";\n");
        let net = from_str(&text, &Default::default());
        assert_eq!(
            net.message_by_id(100).unwrap().comment.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn multi_line_signal_comment() {
        let text = format!("{BASE}CM_ SG_ 100 RPM \"first line\nsecond \\\"quoted\\\" line\";\n");
        let net = from_str(&text, &Default::default());
        let m = net.message_by_id(100).unwrap();
        let (_, s) = net.signal_by_name(m, "RPM").unwrap();
        assert_eq!(
            s.comment.as_deref(),
            Some("first line\nsecond \"quoted\" line")
        );
    }

    #[test]
    fn dangling_references_are_reported() {
        let text = format!(
            "{BASE}CM_ BO_ 7 \"x\";\nCM_ SG_ 100 Nope \"x\";\nCM_ BU_ Ghost \"x\";\n"
        );
        let net = from_str(&text, &Default::default());
        let kinds: Vec<&DiagnosticKind> = net.diagnostics().iter().map(|d| &d.kind).collect();
        assert!(matches!(kinds[0], DiagnosticKind::UnknownMessage { reference } if reference == "7"));
        assert!(matches!(kinds[1], DiagnosticKind::UnknownSignal { .. }));
        assert!(matches!(kinds[2], DiagnosticKind::UnknownNode { .. }));
    }
}
