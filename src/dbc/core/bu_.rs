use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{database::Network, errors::RecordError};

/// Decode the BU_ line listing node names and register them in the network.
/// Example: `BU_: ECU1 ECU2 ECU3`
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let mut c: Cursor<'_> = Cursor::new(line).keyword("BU_")?.expect(':', "':'")?;
    while !c.at_end() {
        let (next, name) = c.identifier()?;
        // creates if missing, returns the existing key otherwise
        net.add_node_if_absent(name);
        ctx.echo(format_args!("BU_ {name}"));
        c = next.eat(',').0;
    }
    Ok(())
}
