use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    attributes::{AttributeDefinition, AttributeKind, AttributeScope},
    database::Network,
    errors::RecordError,
};

/// Decode an attribute definition.
/// Examples:
/// - `BA_DEF_ BO_ "GenMsgCycleTime" INT 0 65535;`
/// - `BA_DEF_ SG_ "GenSigStartValue" FLOAT -1e9 1e9;`
/// - `BA_DEF_ "BusType" STRING ;`
/// - `BA_DEF_ BO_ "VFrameFormat" ENUM "StandardCAN","ExtendedCAN";`
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("BA_DEF_")?;

    let (c, scope) = if let Ok(c) = c.keyword("BU_") {
        (c, AttributeScope::Node)
    } else if let Ok(c) = c.keyword("BO_") {
        (c, AttributeScope::Message)
    } else if let Ok(c) = c.keyword("SG_") {
        (c, AttributeScope::Signal)
    } else if c.keyword("EV_").is_ok() {
        log::trace!("ignoring environment variable attribute definition");
        return Ok(());
    } else {
        (c, AttributeScope::Network)
    };

    let (c, name) = c.quoted()?;
    let (c, kind_token) = c.identifier()?;
    let kind: AttributeKind = match kind_token {
        "INT" => {
            let (c, min) = c.float()?;
            let (_, max) = c.float()?;
            AttributeKind::Int {
                min: min as i64,
                max: max as i64,
            }
        }
        "HEX" => {
            let (c, min) = c.float()?;
            let (_, max) = c.float()?;
            AttributeKind::Hex {
                min: min as i64,
                max: max as i64,
            }
        }
        "FLOAT" => {
            let (c, min) = c.float()?;
            let (_, max) = c.float()?;
            AttributeKind::Float { min, max }
        }
        "STRING" => AttributeKind::String,
        "ENUM" => {
            let mut choices: Vec<String> = Vec::new();
            let mut c: Cursor<'_> = c;
            while !c.at_end() {
                let (next, choice) = c.quoted()?;
                choices.push(choice);
                c = next.eat(',').0;
            }
            AttributeKind::Enum(choices)
        }
        other => {
            return Err(RecordError::Invalid(format!(
                "unknown attribute type '{other}'"
            )));
        }
    };

    ctx.echo(format_args!("BA_DEF_ {scope} \"{name}\" {kind}"));
    let sym = net.intern(&name);
    net.define_attribute(AttributeDefinition {
        name: sym,
        scope,
        kind,
        default: None,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::dbc::parse::from_str;
    use crate::dbc::types::attributes::{AttributeKind, AttributeScope};

    #[test]
    fn every_kind_is_parsed() {
        let net = from_str(
            concat!(
                "BA_DEF_ BO_ \"GenMsgCycleTime\" INT 0 65535;\n",
                "BA_DEF_ SG_ \"GenSigStartValue\" FLOAT -1e9 1e9;\n",
                "BA_DEF_ \"BusType\" STRING ;\n",
                "BA_DEF_ BU_ \"NmStationAddress\" HEX 0 255;\n",
                "BA_DEF_ BO_ \"VFrameFormat\" ENUM \"StandardCAN\",\"ExtendedCAN\";\n",
            ),
            &Default::default(),
        );
        assert!(net.diagnostics().is_empty());

        let d = net.attribute_definition("GenMsgCycleTime").unwrap();
        assert_eq!(d.scope, AttributeScope::Message);
        assert_eq!(d.kind, AttributeKind::Int { min: 0, max: 65535 });

        let d = net.attribute_definition("GenSigStartValue").unwrap();
        assert_eq!(d.scope, AttributeScope::Signal);
        assert_eq!(d.kind, AttributeKind::Float { min: -1e9, max: 1e9 });

        let d = net.attribute_definition("BusType").unwrap();
        assert_eq!(d.scope, AttributeScope::Network);
        assert_eq!(d.kind, AttributeKind::String);

        let d = net.attribute_definition("NmStationAddress").unwrap();
        assert_eq!(d.scope, AttributeScope::Node);
        assert_eq!(d.kind, AttributeKind::Hex { min: 0, max: 255 });

        let d = net.attribute_definition("VFrameFormat").unwrap();
        assert_eq!(
            d.kind,
            AttributeKind::Enum(vec!["StandardCAN".into(), "ExtendedCAN".into()])
        );
    }

    #[test]
    fn unknown_type_is_malformed() {
        let net = from_str("BA_DEF_ \"X\" BLOB;\n", &Default::default());
        assert!(net.attribute_definition("X").is_none());
        assert_eq!(net.diagnostics().len(), 1);
    }
}
