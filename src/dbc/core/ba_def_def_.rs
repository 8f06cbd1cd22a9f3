use crate::dbc::core::ba_::{literal, typed};
use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{
    attributes::AttributeValue, database::Network, errors::RecordError, names::Symbol,
};

/// Decode an attribute default and store it on its definition.
/// Example: `BA_DEF_DEF_ "GenMsgCycleTime" 100;`
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("BA_DEF_DEF_")?;
    let (c, name) = c.quoted()?;
    let (_, literal) = literal(c)?;
    ctx.echo(format_args!("BA_DEF_DEF_ \"{name}\" {literal:?}"));

    let sym: Symbol = net.intern(&name);
    // without a definition `typed` reports the attribute and there is nothing to complete
    let default: Option<AttributeValue> = typed(net, ctx, sym, &name, literal);
    if let Some(definition) = net.attribute_definition_mut(sym) {
        definition.default = default;
    }
    Ok(())
}
